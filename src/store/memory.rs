//! In-memory store with JSON snapshot persistence.
//!
//! All state lives behind one mutex; a snapshot of the full state can
//! be written to / restored from a JSON file across restarts. The
//! snapshot is best-effort durability, not a transaction log.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::QuoteStore;
use crate::types::{Bookmaker, Event, MarketKind, MarketQuote, Opportunity};

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "linehawk_state.json";

/// Full store state, serialized as one JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    events: HashMap<String, Event>,
    bookmakers: HashMap<String, Bookmaker>,
    /// Keyed by `{event_key}:{market_key}`.
    quotes: HashMap<String, Vec<MarketQuote>>,
    /// Keyed like `quotes`.
    opportunities: HashMap<String, Vec<Opportunity>>,
}

fn pair_key(event_key: &str, market: MarketKind) -> String {
    format!("{}:{}", event_key, market.key())
}

pub struct MemoryStore {
    inner: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreState::default()),
        }
    }

    /// Restore from a snapshot file, or start empty when none exists.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

        if !Path::new(path).exists() {
            info!(path, "No saved snapshot found, starting fresh");
            return Ok(Self::new());
        }

        let json = std::fs::read_to_string(path)
            .context(format!("Failed to read snapshot from {path}"))?;
        let state: StoreState = serde_json::from_str(&json)
            .context(format!("Failed to parse snapshot from {path}"))?;

        info!(
            path,
            events = state.events.len(),
            opportunities = state.opportunities.values().map(Vec::len).sum::<usize>(),
            "Snapshot loaded from disk"
        );

        Ok(Self {
            inner: Mutex::new(state),
        })
    }

    /// Write the current state to a snapshot file.
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
        let state = self.lock()?;
        let json = serde_json::to_string_pretty(&*state)
            .context("Failed to serialise store snapshot")?;

        std::fs::write(path, &json).context(format!("Failed to write snapshot to {path}"))?;

        debug!(path, events = state.events.len(), "Snapshot saved");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("Store mutex poisoned"))
    }

    /// Number of stored events.
    pub fn event_count(&self) -> Result<usize> {
        Ok(self.lock()?.events.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteStore for MemoryStore {
    fn upsert_event(&self, event: &Event) -> Result<()> {
        self.lock()?
            .events
            .insert(event.event_key.clone(), event.clone());
        Ok(())
    }

    fn upsert_bookmakers(&self, bookmakers: &[Bookmaker]) -> Result<()> {
        let mut state = self.lock()?;
        for bm in bookmakers {
            state.bookmakers.insert(bm.key.clone(), bm.clone());
        }
        Ok(())
    }

    fn replace_quotes(
        &self,
        event_key: &str,
        market: MarketKind,
        quotes: Vec<MarketQuote>,
    ) -> Result<()> {
        let key = pair_key(event_key, market);
        let mut state = self.lock()?;
        if quotes.is_empty() {
            state.quotes.remove(&key);
        } else {
            state.quotes.insert(key, quotes);
        }
        Ok(())
    }

    fn quotes_for(&self, event_key: &str, market: MarketKind) -> Result<Vec<MarketQuote>> {
        let key = pair_key(event_key, market);
        Ok(self.lock()?.quotes.get(&key).cloned().unwrap_or_default())
    }

    fn replace_opportunities(
        &self,
        event_key: &str,
        market: MarketKind,
        opportunities: Vec<Opportunity>,
    ) -> Result<()> {
        let key = pair_key(event_key, market);
        let mut state = self.lock()?;
        if opportunities.is_empty() {
            state.opportunities.remove(&key);
        } else {
            state.opportunities.insert(key, opportunities);
        }
        Ok(())
    }

    fn list_opportunities(&self) -> Result<Vec<Opportunity>> {
        let state = self.lock()?;
        let mut all: Vec<Opportunity> = state
            .opportunities
            .values()
            .flat_map(|ops| ops.iter().cloned())
            .collect();
        // Best margin first; ties broken by recency for a stable feed
        all.sort_by(|a, b| {
            b.profit_margin
                .partial_cmp(&a.profit_margin)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.detected_at.cmp(&a.detected_at))
        });
        Ok(all)
    }

    fn prune_opportunities(&self, older_than: DateTime<Utc>) -> Result<usize> {
        let mut state = self.lock()?;
        let before: usize = state.opportunities.values().map(Vec::len).sum();
        for ops in state.opportunities.values_mut() {
            ops.retain(|op| op.detected_at >= older_than);
        }
        state.opportunities.retain(|_, ops| !ops.is_empty());
        let after: usize = state.opportunities.values().map(Vec::len).sum();

        let removed = before - after;
        if removed > 0 {
            debug!(removed, "Pruned stale opportunities");
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
