//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ApiState>`.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::collector::QuotaLedger;
use crate::error::{StakeError, SweepError};
use crate::scheduler::Scheduler;
use crate::stakes;
use crate::store::QuoteStore;
use crate::types::{Opportunity, StakePlan, SweepSummary};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub store: Arc<dyn QuoteStore>,
    pub scheduler: Arc<Scheduler>,
    pub quota: Arc<QuotaLedger>,
    /// Bankroll for `/api/stakes` when the caller omits one.
    pub default_bankroll: f64,
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub last_sweep: Option<SweepSummary>,
    pub sweep_in_flight: bool,
    pub active_opportunities: usize,
    pub quota_used: u32,
    pub quota_max: u32,
    pub quota_remaining: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakeRequest {
    pub opportunity_id: Uuid,
    pub bankroll: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: msg.into(),
        }),
    )
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "Store read failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/opportunities — current findings, best margin first.
pub async fn get_opportunities(
    State(state): State<AppState>,
) -> Result<Json<Vec<Opportunity>>, ApiError> {
    let ops = state.store.list_opportunities().map_err(internal)?;
    Ok(Json(ops))
}

/// GET /api/summary — last sweep outcome plus quota standing.
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let active = state.store.list_opportunities().map_err(internal)?.len();
    Ok(Json(SummaryResponse {
        last_sweep: state.scheduler.last_summary().await,
        sweep_in_flight: state.scheduler.is_running(),
        active_opportunities: active,
        quota_used: state.quota.used(),
        quota_max: state.quota.max(),
        quota_remaining: state.quota.remaining(),
    }))
}

/// POST /api/sweep — trigger an immediate sweep.
///
/// 409 when a sweep is already in flight, 429 when the monthly request
/// quota is spent.
pub async fn post_sweep(State(state): State<AppState>) -> Result<Json<SweepSummary>, ApiError> {
    match state.scheduler.run_guarded().await {
        Ok(summary) => Ok(Json(summary)),
        Err(SweepError::InFlight) => Err(api_error(
            StatusCode::CONFLICT,
            "A sweep is already in flight",
        )),
        Err(SweepError::QuotaExceeded { used, max }) => Err(api_error(
            StatusCode::TOO_MANY_REQUESTS,
            format!("Monthly request quota exhausted ({used}/{max})"),
        )),
    }
}

/// POST /api/stakes — stake split for one stored opportunity.
pub async fn post_stakes(
    State(state): State<AppState>,
    Json(req): Json<StakeRequest>,
) -> Result<Json<StakePlan>, ApiError> {
    let ops = state.store.list_opportunities().map_err(internal)?;
    let opportunity = ops
        .iter()
        .find(|op| op.id == req.opportunity_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Opportunity not found"))?;

    let bankroll = req.bankroll.unwrap_or(state.default_bankroll);
    match stakes::allocate(&opportunity.legs, bankroll) {
        Ok(plan) => Ok(Json(plan)),
        Err(e @ (StakeError::InvalidBankroll(_) | StakeError::InvalidOdds { .. })) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ StakeError::NoLegs) => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            e.to_string(),
        )),
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}
