//! Line grouper.
//!
//! Partitions the quotes for one `(event, market)` pair into groups
//! sharing the same handicap/total line. Comparing odds across
//! different lines is meaningless — an Over 2.5 price does not hedge
//! an Under 3.5 price — so the detector only ever sees one group at a
//! time. Equality is on the parsed numeric line (`LineKey`), never the
//! source string.

use std::collections::HashMap;

use crate::types::{LineKey, MarketQuote};

/// Quotes for one `(event, market, line)` triple.
#[derive(Debug, Clone)]
pub struct LineGroup {
    pub key: LineKey,
    pub quotes: Vec<MarketQuote>,
}

impl LineGroup {
    /// Distinct outcome names present in this group, sorted for
    /// deterministic detection order.
    pub fn distinct_outcomes(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for q in &self.quotes {
            if !names.contains(&q.outcome) {
                names.push(q.outcome.clone());
            }
        }
        names.sort();
        names
    }
}

/// Bucket quotes by line. Groups with fewer than two quotes are
/// discarded — a single price cannot be arbitraged.
///
/// The input is assumed to belong to a single `(event, market)` pair;
/// callers split by market kind before grouping.
pub fn group_by_line(quotes: &[MarketQuote]) -> Vec<LineGroup> {
    let mut buckets: HashMap<LineKey, Vec<MarketQuote>> = HashMap::new();
    for quote in quotes {
        buckets.entry(quote.line_key()).or_default().push(quote.clone());
    }

    let mut groups: Vec<LineGroup> = buckets
        .into_iter()
        .filter(|(_, quotes)| quotes.len() >= 2)
        .map(|(key, quotes)| LineGroup { key, quotes })
        .collect();

    // Deterministic order across sweeps
    groups.sort_by_key(|g| match g.key {
        LineKey::Moneyline => i64::MIN,
        LineKey::Line(millis) => millis,
    });
    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
