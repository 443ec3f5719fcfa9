//! Quote and opportunity store.
//!
//! The sweep writes canonical events, bookmakers, quotes and detected
//! opportunities through the `QuoteStore` trait; the API layer reads
//! back through the same trait. The shipped implementation is
//! in-memory with a JSON snapshot on disk (`memory::MemoryStore`) —
//! a relational backend can slot in behind the trait later.

pub mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::types::{Bookmaker, Event, MarketKind, MarketQuote, Opportunity};

/// Persistence seam between the sweep and the read side.
///
/// Replacement semantics: a sweep always rewrites the full quote set
/// for an `(event, market)` pair, so a re-run over unchanged feed data
/// leaves the store unchanged rather than accumulating duplicates.
#[cfg_attr(test, mockall::automock)]
pub trait QuoteStore: Send + Sync {
    /// Insert or update an event row, keyed by its natural key.
    fn upsert_event(&self, event: &Event) -> Result<()>;

    /// Insert or update bookmaker rows, keyed by bookmaker key.
    fn upsert_bookmakers(&self, bookmakers: &[Bookmaker]) -> Result<()>;

    /// Replace every stored quote for `(event_key, market)`.
    fn replace_quotes(
        &self,
        event_key: &str,
        market: MarketKind,
        quotes: Vec<MarketQuote>,
    ) -> Result<()>;

    /// Current quotes for `(event_key, market)`.
    fn quotes_for(&self, event_key: &str, market: MarketKind) -> Result<Vec<MarketQuote>>;

    /// Replace every stored opportunity for `(event_key, market)`.
    /// Passing an empty vector clears stale findings for the pair.
    fn replace_opportunities(
        &self,
        event_key: &str,
        market: MarketKind,
        opportunities: Vec<Opportunity>,
    ) -> Result<()>;

    /// All current opportunities, best profit margin first.
    fn list_opportunities(&self) -> Result<Vec<Opportunity>>;

    /// Drop opportunities detected before `older_than`; returns how
    /// many were removed.
    fn prune_opportunities(&self, older_than: DateTime<Utc>) -> Result<usize>;
}
