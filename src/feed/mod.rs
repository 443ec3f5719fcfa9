//! Odds feed collaborator.
//!
//! Defines the `OddsFeed` trait the orchestrator sweeps against, plus
//! the raw wire shapes returned by The Odds API v4. The normalizer
//! consumes these payloads directly; everything downstream works on
//! canonical types from `crate::types`.

pub mod the_odds_api;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::Sport;

// ---------------------------------------------------------------------------
// Wire payloads (The Odds API JSON → Rust)
// ---------------------------------------------------------------------------

/// One event with per-bookmaker market quotes, as returned by
/// `/sports/{sport}/odds`. Only the fields we need are deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub id: String,
    pub sport_key: String,
    #[serde(default)]
    pub sport_title: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<BookmakerPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookmakerPayload {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<MarketPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketPayload {
    /// Feed market key, e.g. "h2h", "spreads", "totals". Unknown keys
    /// are dropped by the normalizer.
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<OutcomePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutcomePayload {
    pub name: String,
    pub price: f64,
    /// Handicap/total line for spreads and totals markets.
    #[serde(default)]
    pub point: Option<f64>,
}

// ---------------------------------------------------------------------------
// Feed trait
// ---------------------------------------------------------------------------

/// Abstraction over the external odds source.
///
/// Each call consumes one unit of the monthly request quota; the
/// orchestrator accounts for it before invoking either method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OddsFeed: Send + Sync {
    /// Fetch the sport catalogue.
    async fn fetch_sports(&self) -> Result<Vec<Sport>>;

    /// Fetch events with decimal odds for one sport.
    ///
    /// `regions` is a comma-separated bookmaker region list and
    /// `markets` a comma-separated market-key list (see `MarketKind`).
    async fn fetch_odds(
        &self,
        sport_key: &str,
        regions: &str,
        markets: &str,
    ) -> Result<Vec<EventPayload>>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
