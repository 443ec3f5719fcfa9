//! Typed error taxonomy.
//!
//! Only two conditions abort a sweep as a whole: an exhausted request
//! quota and an already-running sweep. Every other failure (fetch,
//! malformed quote, persistence) is scoped to one sport, event, or
//! quote and handled where it occurs. A sweep that runs out of wall
//! clock is not an error — it completes with a partial summary.

use thiserror::Error;

/// Errors that abort an entire sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The monthly request quota is spent. No partial fetching is
    /// attempted; the sweep reports cleanly and waits for the next
    /// period.
    #[error("request quota exceeded: {used}/{max} this period")]
    QuotaExceeded { used: u32, max: u32 },

    /// Another sweep is currently running. Overlapping triggers are
    /// rejected rather than queued.
    #[error("a sweep is already in flight")]
    InFlight,
}

/// Errors from stake allocation. Any of these invalidates the whole
/// computation — the allocator never emits negative or undefined
/// stakes.
#[derive(Debug, Error, PartialEq)]
pub enum StakeError {
    #[error("bankroll must be positive, got {0}")]
    InvalidBankroll(f64),

    #[error("leg '{outcome}' has unusable odds {odds}")]
    InvalidOdds { outcome: String, odds: f64 },

    #[error("opportunity has no legs")]
    NoLegs,
}
