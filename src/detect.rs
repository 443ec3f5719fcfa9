//! Arbitrage detector.
//!
//! Given one line group, enumerates every way to cover all outcomes
//! with one quote per outcome and flags the combinations whose implied
//! probabilities sum strictly below the configured threshold. The
//! enumeration is exhaustive, not an optimization: bookmaker counts per
//! event are small (typically ≤ 15) and outcome counts are 2–3, so the
//! combination count stays bounded by roughly quotes_per_outcome^k.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::grouping::LineGroup;
use crate::types::{Event, MarketQuote, Opportunity, OpportunityLeg};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Detection thresholds. An opportunity is flagged when the implied
/// probability sum is strictly below the threshold for its market
/// state. Live markets get a stricter cutoff: odds can move between
/// placing the legs, so a larger safety margin is prudent.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub prematch_threshold: f64,
    pub live_threshold: f64,
    /// When set, every leg of an opportunity must come from a
    /// different bookmaker. Off by default: the reference behavior only
    /// forbids reusing the same quote row, and a bookmaker's own book
    /// sums to ≥ 1 so same-book legs are harmless in practice.
    pub require_distinct_bookmakers: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            prematch_threshold: 0.99,
            live_threshold: 0.985,
            require_distinct_bookmakers: false,
        }
    }
}

impl DetectorConfig {
    /// The implied-sum cutoff for a market state.
    pub fn threshold_for(&self, is_live: bool) -> f64 {
        if is_live {
            self.live_threshold
        } else {
            self.prematch_threshold
        }
    }
}

impl From<&crate::config::DetectionSettings> for DetectorConfig {
    fn from(s: &crate::config::DetectionSettings) -> Self {
        Self {
            prematch_threshold: s.prematch_threshold,
            live_threshold: s.live_threshold,
            require_distinct_bookmakers: s.require_distinct_bookmakers,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection generator
// ---------------------------------------------------------------------------

/// Lazy sequence of leg assignments over a line group: each item picks
/// exactly one quote per distinct outcome, and no quote row is reused
/// across two legs.
///
/// Implemented as an odometer over per-outcome candidate pools so the
/// enumeration is unit-testable independent of the sweep.
pub struct Selections<'a> {
    /// Candidate quote indices per outcome slot, in sorted outcome order.
    pools: Vec<Vec<usize>>,
    quotes: &'a [MarketQuote],
    /// Odometer position; `None` once exhausted (or empty from the start).
    cursor: Option<Vec<usize>>,
}

impl<'a> Selections<'a> {
    /// Build the generator for a group's quotes and its distinct
    /// outcome names (sorted; see `LineGroup::distinct_outcomes`).
    pub fn new(quotes: &'a [MarketQuote], outcomes: &[String]) -> Self {
        let pools: Vec<Vec<usize>> = outcomes
            .iter()
            .map(|name| {
                quotes
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| &q.outcome == name)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        let cursor = if pools.is_empty() || pools.iter().any(|p| p.is_empty()) {
            None
        } else {
            Some(vec![0; pools.len()])
        };

        Self {
            pools,
            quotes,
            cursor,
        }
    }

    /// Advance the odometer; clears the cursor once every combination
    /// has been visited.
    fn advance(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        for slot in (0..cursor.len()).rev() {
            cursor[slot] += 1;
            if cursor[slot] < self.pools[slot].len() {
                return;
            }
            cursor[slot] = 0;
        }
        self.cursor = None;
    }
}

impl<'a> Iterator for Selections<'a> {
    type Item = Vec<&'a MarketQuote>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.cursor.as_ref()?;
            let picked: Vec<usize> = cursor
                .iter()
                .enumerate()
                .map(|(slot, &i)| self.pools[slot][i])
                .collect();

            // A single quote row may not cover two legs
            let distinct = picked
                .iter()
                .enumerate()
                .all(|(i, a)| picked[..i].iter().all(|b| a != b));

            self.advance();

            if distinct {
                return Some(picked.iter().map(|&i| &self.quotes[i]).collect());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Flags fully-hedged, profitable bet sets inside line groups.
pub struct ArbitrageDetector {
    config: DetectorConfig,
}

impl ArbitrageDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Access the detector configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate one line group and return every combination that locks
    /// in a profit. A group may yield more than one valid opportunity
    /// (different bookmaker pairings over the same outcomes).
    pub fn detect(&self, event: &Event, group: &LineGroup) -> Vec<Opportunity> {
        let outcomes = group.distinct_outcomes();
        // Need at least two mutually exclusive bets to hedge
        if outcomes.len() < 2 {
            return Vec::new();
        }

        let threshold = self.config.threshold_for(event.is_live);
        let mut found = Vec::new();

        for selection in Selections::new(&group.quotes, &outcomes) {
            if self.config.require_distinct_bookmakers {
                let books: Vec<&str> =
                    selection.iter().map(|q| q.bookmaker_key.as_str()).collect();
                let all_distinct = books
                    .iter()
                    .enumerate()
                    .all(|(i, b)| !books[..i].contains(b));
                if !all_distinct {
                    continue;
                }
            }

            let implied_sum: f64 = selection.iter().map(|q| 1.0 / q.price).sum();
            // Strict inequality: a dead-even book is not an opportunity
            if implied_sum >= threshold {
                continue;
            }

            let profit_margin = (1.0 / implied_sum - 1.0) * 100.0;
            let market = selection[0].market;

            debug!(
                event = %event.event_key,
                market = %market,
                line = %group.key,
                implied_sum,
                profit_margin = format!("{profit_margin:.2}%"),
                "Arbitrage found"
            );

            found.push(Opportunity {
                id: Uuid::new_v4(),
                event_key: event.event_key.clone(),
                sport_title: event.sport_title.clone(),
                home_team: event.home_team.clone(),
                away_team: event.away_team.clone(),
                commence_time: event.commence_time,
                market,
                market_display_name: market.display_name().to_string(),
                line: group.key.as_f64(),
                legs: selection
                    .iter()
                    .map(|q| OpportunityLeg {
                        outcome: q.outcome.clone(),
                        odds: q.price,
                        bookmaker_key: q.bookmaker_key.clone(),
                        bookmaker_title: q.bookmaker_title.clone(),
                    })
                    .collect(),
                arb_percent: implied_sum * 100.0,
                profit_margin,
                is_live: event.is_live,
                // All legs come from one market/line group
                is_cross_market: false,
                detected_at: Utc::now(),
            });
        }

        found
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
