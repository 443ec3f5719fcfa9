//! Sweep scheduler.
//!
//! Owns the periodic cadence and the single-flight guard. All sweep
//! triggers — the timer tick and the manual API endpoint — go through
//! `run_guarded`, so at most one sweep runs at a time and an
//! overlapping trigger is rejected instead of queued.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::collector::Sweeper;
use crate::error::SweepError;
use crate::types::SweepSummary;

pub struct Scheduler {
    sweeper: Arc<Sweeper>,
    interval_secs: u64,
    // try_lock failure is the overlap signal
    in_flight: Mutex<()>,
    last_summary: RwLock<Option<SweepSummary>>,
}

impl Scheduler {
    pub fn new(sweeper: Arc<Sweeper>, interval_secs: u64) -> Self {
        Self {
            sweeper,
            interval_secs,
            in_flight: Mutex::new(()),
            last_summary: RwLock::new(None),
        }
    }

    /// Whether a sweep is currently executing.
    pub fn is_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Summary of the most recent completed sweep, if any.
    pub async fn last_summary(&self) -> Option<SweepSummary> {
        self.last_summary.read().await.clone()
    }

    /// Run one sweep unless another is already in flight.
    pub async fn run_guarded(&self) -> Result<SweepSummary, SweepError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Sweep trigger rejected: another sweep is in flight");
            return Err(SweepError::InFlight);
        };
        let summary = self.sweeper.run_sweep().await?;
        *self.last_summary.write().await = Some(summary.clone());
        Ok(summary)
    }

    /// Periodic sweep loop. Runs until `shutdown` resolves.
    pub async fn run_loop(&self, shutdown: impl std::future::Future<Output = ()>) {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(self.interval_secs));
        tokio::pin!(shutdown);

        info!(interval_secs = self.interval_secs, "Scheduler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_guarded().await {
                        Ok(summary) => info!(
                            opportunities = summary.opportunities_found,
                            events = summary.events_processed,
                            "Scheduled sweep finished"
                        ),
                        Err(SweepError::InFlight) => {
                            // Previous sweep still running; skip this tick
                        }
                        Err(e) => error!(error = %e, "Scheduled sweep failed"),
                    }
                }
                _ = &mut shutdown => {
                    info!("Scheduler stopping");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
