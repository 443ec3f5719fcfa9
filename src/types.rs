//! Shared types for the LINEHAWK scanner.
//!
//! These types form the data model used across all modules: the feed,
//! normalizer, grouper, detector, allocator, and store all depend on
//! them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sports & events
// ---------------------------------------------------------------------------

/// A sport exposed by the odds feed catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sport {
    pub key: String,
    #[serde(default)]
    pub group: String,
    pub title: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub has_outrights: bool,
}

/// A scheduled (or in-play) match between two teams.
///
/// Identity is `event_key` — the feed's event id when present, otherwise
/// a composite of sport and team names. Events are upserted idempotently
/// on every sweep and never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_key: String,
    pub sport_key: String,
    pub sport_title: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub is_live: bool,
}

impl Event {
    /// Stable natural key: the source id when available, otherwise
    /// `(sport_key, home_team, away_team)` joined.
    pub fn natural_key(
        source_id: &str,
        sport_key: &str,
        home_team: &str,
        away_team: &str,
    ) -> String {
        if source_id.is_empty() {
            format!("{sport_key}_{home_team}_{away_team}")
        } else {
            source_id.to_string()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} vs {} @ {}{}",
            self.sport_key,
            self.home_team,
            self.away_team,
            self.commence_time.format("%Y-%m-%d %H:%M"),
            if self.is_live { " (LIVE)" } else { "" },
        )
    }
}

/// A bookmaker. Identity is `key`; upserted on first sighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Markets & quotes
// ---------------------------------------------------------------------------

/// Supported market types. Unknown feed keys are dropped by the
/// normalizer (forward-compatible ignore policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    /// Moneyline / match winner. No line.
    H2h,
    /// Handicap. Line is the spread value.
    Spreads,
    /// Over/under. Line is the total.
    Totals,
}

impl MarketKind {
    /// Parse a feed market key. Returns `None` for unsupported markets.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "h2h" => Some(MarketKind::H2h),
            "spreads" => Some(MarketKind::Spreads),
            "totals" => Some(MarketKind::Totals),
            _ => None,
        }
    }

    /// The feed-side market key.
    pub fn key(&self) -> &'static str {
        match self {
            MarketKind::H2h => "h2h",
            MarketKind::Spreads => "spreads",
            MarketKind::Totals => "totals",
        }
    }

    /// Human-readable market name.
    pub fn display_name(&self) -> &'static str {
        match self {
            MarketKind::H2h => "Match Winner",
            MarketKind::Spreads => "Spread/Handicap",
            MarketKind::Totals => "Over/Under",
        }
    }

    /// Whether quotes in this market carry a numeric line.
    pub fn has_line(&self) -> bool {
        !matches!(self, MarketKind::H2h)
    }

    /// All supported kinds, in feed request order.
    pub fn all() -> [MarketKind; 3] {
        [MarketKind::H2h, MarketKind::Spreads, MarketKind::Totals]
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One bookmaker's posted price for one outcome of one market on one
/// event. Prices are decimal odds, strictly greater than 1.0 (enforced
/// by the normalizer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketQuote {
    pub event_key: String,
    pub market: MarketKind,
    pub bookmaker_key: String,
    pub bookmaker_title: String,
    pub outcome: String,
    pub price: f64,
    /// Market-level line; `None` for moneyline-style markets. Spread
    /// quotes carry the home-oriented handicap regardless of which
    /// side the outcome backs.
    pub line: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl MarketQuote {
    /// Implied probability of this outcome at this price.
    pub fn implied_probability(&self) -> f64 {
        1.0 / self.price
    }

    /// Grouping key for this quote's line.
    pub fn line_key(&self) -> LineKey {
        LineKey::new(self.market, self.line)
    }
}

/// Grouping key with exact-equality semantics for parsed numeric lines.
///
/// Lines are held as fixed-point thousandths so "2.5" and "2.50" group
/// together regardless of source formatting. The sign is significant:
/// Arsenal -1.5 and Spurs -1.5 are different handicaps that can both
/// lose (a one-goal home win), so they must never share a group. The
/// normalizer stores the home-oriented market line on every spread
/// quote, which makes complementary sides carry the same signed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKey {
    /// No-line sentinel for moneyline markets.
    Moneyline,
    /// Signed line value in thousandths.
    Line(i64),
}

impl LineKey {
    pub fn new(market: MarketKind, line: Option<f64>) -> Self {
        match line {
            Some(v) if market.has_line() => LineKey::Line((v * 1000.0).round() as i64),
            _ => LineKey::Moneyline,
        }
    }

    /// The numeric line value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LineKey::Moneyline => None,
            LineKey::Line(millis) => Some(*millis as f64 / 1000.0),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_f64() {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "-"),
        }
    }
}

// ---------------------------------------------------------------------------
// Opportunities
// ---------------------------------------------------------------------------

/// One leg of an arbitrage opportunity: the outcome to back, the price,
/// and where it is quoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityLeg {
    pub outcome: String,
    pub odds: f64,
    pub bookmaker_key: String,
    pub bookmaker_title: String,
}

/// A detected arbitrage: one leg per distinct outcome of a line group,
/// with implied probabilities summing below the detection threshold.
///
/// Numeric fields are derived at detection time and never mutated;
/// stale opportunities are pruned by age, not updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub event_key: String,
    pub sport_title: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub market: MarketKind,
    pub market_display_name: String,
    pub line: Option<f64>,
    pub legs: Vec<OpportunityLeg>,
    /// Sum of implied probabilities × 100. Strictly < threshold × 100.
    pub arb_percent: f64,
    /// Guaranteed ROI %: `(1 / implied_sum - 1) × 100`.
    pub profit_margin: f64,
    pub is_live: bool,
    /// False for all single-market detections; reserved for scans that
    /// combine legs across related markets.
    pub is_cross_market: bool,
    pub detected_at: DateTime<Utc>,
}

impl Opportunity {
    /// Sum of implied probabilities across all legs.
    pub fn implied_sum(&self) -> f64 {
        self.legs.iter().map(|l| 1.0 / l.odds).sum()
    }
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let legs: Vec<String> = self
            .legs
            .iter()
            .map(|l| format!("{} @ {:.2} ({})", l.outcome, l.odds, l.bookmaker_title))
            .collect();
        write!(
            f,
            "{} vs {} [{} {}] {} → +{:.2}%",
            self.home_team,
            self.away_team,
            self.market_display_name,
            self.line.map(|l| l.to_string()).unwrap_or_else(|| "-".into()),
            legs.join(" / "),
            self.profit_margin,
        )
    }
}

// ---------------------------------------------------------------------------
// Stake plans
// ---------------------------------------------------------------------------

/// Stake for one leg of an opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeLeg {
    pub outcome: String,
    pub bookmaker_title: String,
    pub odds: f64,
    pub stake: f64,
    /// `stake × odds` — identical across legs by construction.
    pub payout: f64,
}

/// Per-leg stake split for a bankroll such that every leg returns the
/// same guaranteed payout. Derived on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakePlan {
    pub stakes: Vec<StakeLeg>,
    pub total_stake: f64,
    pub guaranteed_return: f64,
    pub profit: f64,
    pub roi_pct: f64,
}

// ---------------------------------------------------------------------------
// Sweep summary
// ---------------------------------------------------------------------------

/// What one sweep actually processed. Counts reflect completed work
/// only — a budget-exceeded sweep reports partial totals, never
/// inflated ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    pub events_processed: usize,
    pub markets_processed: usize,
    pub opportunities_found: usize,
    pub sports_completed: usize,
    /// Sports skipped due to fetch failure, catalogue filtering, or
    /// the time budget.
    pub sports_skipped: usize,
    /// True when the sweep stopped early on the wall-clock budget.
    pub budget_exhausted: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(test)]
impl MarketQuote {
    /// Build a moneyline test quote with sensible defaults.
    pub fn sample(bookmaker: &str, outcome: &str, price: f64) -> Self {
        MarketQuote {
            event_key: "ev-001".to_string(),
            market: MarketKind::H2h,
            bookmaker_key: bookmaker.to_lowercase().replace(' ', "_"),
            bookmaker_title: bookmaker.to_string(),
            outcome: outcome.to_string(),
            price,
            line: None,
            captured_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
