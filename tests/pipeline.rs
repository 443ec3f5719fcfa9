//! End-to-end pipeline tests: stub feed → sweep → store → allocation.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use linehawk::collector::{QuotaLedger, Sweeper};
use linehawk::config::{CollectorSettings, FeedConfig};
use linehawk::detect::{ArbitrageDetector, DetectorConfig};
use linehawk::error::SweepError;
use linehawk::feed::{BookmakerPayload, EventPayload, MarketPayload, OddsFeed, OutcomePayload};
use linehawk::stakes;
use linehawk::store::{MemoryStore, QuoteStore};
use linehawk::types::{MarketKind, Sport};

// ---------------------------------------------------------------------------
// Stub feed
// ---------------------------------------------------------------------------

/// Deterministic in-memory odds feed keyed by sport.
struct StubFeed {
    responses: HashMap<String, Vec<EventPayload>>,
}

impl StubFeed {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    fn with_events(mut self, sport_key: &str, events: Vec<EventPayload>) -> Self {
        self.responses.insert(sport_key.to_string(), events);
        self
    }
}

#[async_trait]
impl OddsFeed for StubFeed {
    async fn fetch_sports(&self) -> Result<Vec<Sport>> {
        // Every stubbed sport is listed as active
        Ok(self
            .responses
            .keys()
            .map(|key| Sport {
                key: key.clone(),
                group: "Soccer".to_string(),
                title: key.to_uppercase(),
                active: true,
                has_outrights: false,
            })
            .collect())
    }

    async fn fetch_odds(
        &self,
        sport_key: &str,
        _regions: &str,
        _markets: &str,
    ) -> Result<Vec<EventPayload>> {
        Ok(self.responses.get(sport_key).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn outcome(name: &str, price: f64, point: Option<f64>) -> OutcomePayload {
    OutcomePayload {
        name: name.to_string(),
        price,
        point,
    }
}

fn bookmaker(key: &str, title: &str, markets: Vec<MarketPayload>) -> BookmakerPayload {
    BookmakerPayload {
        key: key.to_string(),
        title: title.to_string(),
        last_update: None,
        markets,
    }
}

fn event(
    id: &str,
    commence_time: DateTime<Utc>,
    bookmakers: Vec<BookmakerPayload>,
) -> EventPayload {
    EventPayload {
        id: id.to_string(),
        sport_key: "soccer_epl".to_string(),
        sport_title: "EPL".to_string(),
        commence_time,
        home_team: "Arsenal".to_string(),
        away_team: "Spurs".to_string(),
        bookmakers,
    }
}

fn default_settings() -> CollectorSettings {
    CollectorSettings {
        max_events_per_sport: 10,
        time_budget_secs: 15,
        lookback_minutes: 90,
        lookahead_minutes: 120,
        retention_hours: 24,
    }
}

fn feed_cfg(sports: &[&str]) -> FeedConfig {
    FeedConfig {
        api_key_env: "ODDS_API_KEY".to_string(),
        base_url: "http://localhost".to_string(),
        regions: "uk,eu".to_string(),
        target_sports: sports.iter().map(|s| s.to_string()).collect(),
    }
}

fn sweeper_with(
    feed: StubFeed,
    store: Arc<MemoryStore>,
    detector: DetectorConfig,
    quota: QuotaLedger,
) -> Sweeper {
    Sweeper::new(
        Arc::new(feed),
        store,
        Arc::new(quota),
        ArbitrageDetector::new(detector),
        feed_cfg(&["soccer_epl"]),
        default_settings(),
    )
}

/// Arsenal @ 2.10 (Bet365) / Spurs @ 2.05 (Unibet): implied sum
/// ≈ 0.9640, a ≈ 3.73% arbitrage.
fn profitable_h2h_event(commence_time: DateTime<Utc>) -> EventPayload {
    event(
        "ev-derby",
        commence_time,
        vec![
            bookmaker(
                "bet365",
                "Bet365",
                vec![MarketPayload {
                    key: "h2h".to_string(),
                    outcomes: vec![outcome("Arsenal", 2.10, None), outcome("Spurs", 1.70, None)],
                }],
            ),
            bookmaker(
                "unibet",
                "Unibet",
                vec![MarketPayload {
                    key: "h2h".to_string(),
                    outcomes: vec![outcome("Arsenal", 1.75, None), outcome("Spurs", 2.05, None)],
                }],
            ),
        ],
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_pipeline_detects_and_allocates() {
    let upcoming = Utc::now() + Duration::hours(1);
    let feed = StubFeed::new().with_events("soccer_epl", vec![profitable_h2h_event(upcoming)]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(feed, store.clone(), DetectorConfig::default(), QuotaLedger::new(500));

    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.events_processed, 1);
    assert_eq!(summary.opportunities_found, 1);
    assert_eq!(summary.sports_completed, 1);
    assert!(!summary.budget_exhausted);

    let ops = store.list_opportunities().unwrap();
    assert_eq!(ops.len(), 1);
    let op = &ops[0];
    assert_eq!(op.market, MarketKind::H2h);
    assert!((op.profit_margin - 3.7349).abs() < 0.01);
    assert!(op.implied_sum() < 1.0);
    assert!(!op.is_live);

    // The stored legs feed straight into stake allocation
    let plan = stakes::allocate(&op.legs, 1000.0).unwrap();
    let total: f64 = plan.stakes.iter().map(|s| s.stake).sum();
    assert!((total - 1000.0).abs() < 1e-6);
    assert!((plan.guaranteed_return - 1037.35).abs() < 0.01);
    for leg in &plan.stakes {
        assert!((leg.payout - plan.guaranteed_return).abs() < 1e-6);
    }
}

#[tokio::test]
async fn repeated_sweeps_do_not_accumulate() {
    let upcoming = Utc::now() + Duration::hours(1);
    let feed = StubFeed::new().with_events("soccer_epl", vec![profitable_h2h_event(upcoming)]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(feed, store.clone(), DetectorConfig::default(), QuotaLedger::new(500));

    sw.run_sweep().await.unwrap();
    sw.run_sweep().await.unwrap();
    sw.run_sweep().await.unwrap();

    assert_eq!(store.list_opportunities().unwrap().len(), 1);
    assert_eq!(
        store.quotes_for("ev-derby", MarketKind::H2h).unwrap().len(),
        4
    );
    // Each sweep spends one unit on the catalogue and one per sport
    assert_eq!(sw.quota().used(), 6);
}

#[tokio::test]
async fn exhausted_quota_aborts_without_fetching() {
    let upcoming = Utc::now() + Duration::hours(1);
    let feed = StubFeed::new().with_events("soccer_epl", vec![profitable_h2h_event(upcoming)]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(
        feed,
        store.clone(),
        DetectorConfig::default(),
        QuotaLedger::with_used(500, 500),
    );

    let err = sw.run_sweep().await.unwrap_err();
    assert!(matches!(
        err,
        SweepError::QuotaExceeded {
            used: 500,
            max: 500
        }
    ));
    assert!(store.list_opportunities().unwrap().is_empty());
}

#[tokio::test]
async fn even_odds_produce_no_opportunity() {
    let upcoming = Utc::now() + Duration::hours(1);
    let ev = event(
        "ev-even",
        upcoming,
        vec![
            bookmaker(
                "bet365",
                "Bet365",
                vec![MarketPayload {
                    key: "h2h".to_string(),
                    outcomes: vec![outcome("Arsenal", 2.0, None), outcome("Spurs", 1.8, None)],
                }],
            ),
            bookmaker(
                "unibet",
                "Unibet",
                vec![MarketPayload {
                    key: "h2h".to_string(),
                    outcomes: vec![outcome("Arsenal", 1.9, None), outcome("Spurs", 2.0, None)],
                }],
            ),
        ],
    );
    let feed = StubFeed::new().with_events("soccer_epl", vec![ev]);
    let store = Arc::new(MemoryStore::new());
    // Threshold 1.0: even the best pairing (2.0 / 2.0) sums to exactly 1
    let sw = sweeper_with(
        feed,
        store.clone(),
        DetectorConfig {
            prematch_threshold: 1.0,
            ..DetectorConfig::default()
        },
        QuotaLedger::new(500),
    );

    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.events_processed, 1);
    assert_eq!(summary.opportunities_found, 0);
    assert!(store.list_opportunities().unwrap().is_empty());
}

#[tokio::test]
async fn totals_arbitrage_respects_line_boundaries() {
    let upcoming = Utc::now() + Duration::hours(1);
    // Over 2.5 @ 2.10 and Under 3.5 @ 2.05 would "arb" if lines were
    // conflated; the only real pairing is within the 2.5 line
    let ev = event(
        "ev-totals",
        upcoming,
        vec![
            bookmaker(
                "bet365",
                "Bet365",
                vec![MarketPayload {
                    key: "totals".to_string(),
                    outcomes: vec![
                        outcome("Over", 2.10, Some(2.5)),
                        outcome("Under", 1.70, Some(2.5)),
                    ],
                }],
            ),
            bookmaker(
                "unibet",
                "Unibet",
                vec![MarketPayload {
                    key: "totals".to_string(),
                    outcomes: vec![
                        outcome("Over", 1.60, Some(3.5)),
                        outcome("Under", 2.05, Some(3.5)),
                    ],
                }],
            ),
        ],
    );
    let feed = StubFeed::new().with_events("soccer_epl", vec![ev]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(feed, store.clone(), DetectorConfig::default(), QuotaLedger::new(500));

    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.events_processed, 1);
    // Cross-line pairing must never be flagged
    assert_eq!(summary.opportunities_found, 0);
}

#[tokio::test]
async fn same_handicap_side_at_two_books_is_not_an_arb() {
    let upcoming = Utc::now() + Duration::hours(1);
    // Both books price the favourite side of the -1.5 handicap at 2.6.
    // The two bets lose together when Arsenal win by exactly one, so
    // no opportunity may be flagged no matter how fat the prices look.
    let ev = event(
        "ev-spread-trap",
        upcoming,
        vec![
            bookmaker(
                "bet365",
                "Bet365",
                vec![MarketPayload {
                    key: "spreads".to_string(),
                    outcomes: vec![
                        outcome("Arsenal", 2.60, Some(-1.5)),
                        outcome("Spurs", 1.50, Some(1.5)),
                    ],
                }],
            ),
            bookmaker(
                "unibet",
                "Unibet",
                vec![MarketPayload {
                    key: "spreads".to_string(),
                    outcomes: vec![
                        outcome("Arsenal", 1.50, Some(1.5)),
                        outcome("Spurs", 2.60, Some(-1.5)),
                    ],
                }],
            ),
        ],
    );
    let feed = StubFeed::new().with_events("soccer_epl", vec![ev]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(feed, store.clone(), DetectorConfig::default(), QuotaLedger::new(500));

    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.events_processed, 1);
    assert_eq!(summary.opportunities_found, 0);
    assert!(store.list_opportunities().unwrap().is_empty());
}

#[tokio::test]
async fn complementary_handicap_sides_across_books_are_detected() {
    let upcoming = Utc::now() + Duration::hours(1);
    // Arsenal -1.5 @ 2.10 (Bet365) hedged by Spurs +1.5 @ 2.05 (Unibet)
    // covers every result of the same handicap
    let ev = event(
        "ev-spread-arb",
        upcoming,
        vec![
            bookmaker(
                "bet365",
                "Bet365",
                vec![MarketPayload {
                    key: "spreads".to_string(),
                    outcomes: vec![
                        outcome("Arsenal", 2.10, Some(-1.5)),
                        outcome("Spurs", 1.70, Some(1.5)),
                    ],
                }],
            ),
            bookmaker(
                "unibet",
                "Unibet",
                vec![MarketPayload {
                    key: "spreads".to_string(),
                    outcomes: vec![
                        outcome("Arsenal", 1.75, Some(-1.5)),
                        outcome("Spurs", 2.05, Some(1.5)),
                    ],
                }],
            ),
        ],
    );
    let feed = StubFeed::new().with_events("soccer_epl", vec![ev]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(feed, store.clone(), DetectorConfig::default(), QuotaLedger::new(500));

    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.opportunities_found, 1);

    let ops = store.list_opportunities().unwrap();
    assert_eq!(ops.len(), 1);
    let op = &ops[0];
    assert_eq!(op.market, MarketKind::Spreads);
    // The stored line is the home-oriented handicap
    assert_eq!(op.line, Some(-1.5));
    assert!(!op.is_cross_market);
}

#[tokio::test]
async fn distinct_bookmaker_flag_filters_same_book_arbs() {
    let upcoming = Utc::now() + Duration::hours(1);
    // One generous book quoting both sides above 2.0
    let ev = event(
        "ev-generous",
        upcoming,
        vec![bookmaker(
            "bet365",
            "Bet365",
            vec![MarketPayload {
                key: "h2h".to_string(),
                outcomes: vec![outcome("Arsenal", 2.10, None), outcome("Spurs", 2.05, None)],
            }],
        )],
    );

    let store_default = Arc::new(MemoryStore::new());
    let sw = sweeper_with(
        StubFeed::new().with_events("soccer_epl", vec![ev.clone()]),
        store_default.clone(),
        DetectorConfig::default(),
        QuotaLedger::new(500),
    );
    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.opportunities_found, 1);

    let store_strict = Arc::new(MemoryStore::new());
    let sw = sweeper_with(
        StubFeed::new().with_events("soccer_epl", vec![ev]),
        store_strict.clone(),
        DetectorConfig {
            require_distinct_bookmakers: true,
            ..DetectorConfig::default()
        },
        QuotaLedger::new(500),
    );
    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.opportunities_found, 0);
}

#[tokio::test]
async fn live_event_uses_stricter_threshold() {
    // Kicked off 30 minutes ago: inside the lookback window, live rules
    let live_start = Utc::now() - Duration::minutes(30);
    // Implied sum ≈ 0.9879: passes 0.99 pre-match, fails 0.985 live
    let ev = event(
        "ev-live",
        live_start,
        vec![
            bookmaker(
                "bet365",
                "Bet365",
                vec![MarketPayload {
                    key: "h2h".to_string(),
                    outcomes: vec![outcome("Arsenal", 2.03, None), outcome("Spurs", 1.70, None)],
                }],
            ),
            bookmaker(
                "unibet",
                "Unibet",
                vec![MarketPayload {
                    key: "h2h".to_string(),
                    outcomes: vec![outcome("Arsenal", 1.75, None), outcome("Spurs", 2.02, None)],
                }],
            ),
        ],
    );
    let feed = StubFeed::new().with_events("soccer_epl", vec![ev]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(feed, store.clone(), DetectorConfig::default(), QuotaLedger::new(500));

    let summary = sw.run_sweep().await.unwrap();
    assert_eq!(summary.events_processed, 1);
    assert_eq!(summary.opportunities_found, 0);
}

#[tokio::test]
async fn snapshot_survives_restart() {
    let upcoming = Utc::now() + Duration::hours(1);
    let feed = StubFeed::new().with_events("soccer_epl", vec![profitable_h2h_event(upcoming)]);
    let store = Arc::new(MemoryStore::new());
    let sw = sweeper_with(feed, store.clone(), DetectorConfig::default(), QuotaLedger::new(500));
    sw.run_sweep().await.unwrap();

    let mut path = std::env::temp_dir();
    path.push(format!("linehawk_pipeline_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();

    store.save(Some(&path)).unwrap();
    let restored = MemoryStore::load(Some(&path)).unwrap();
    let ops = restored.list_opportunities().unwrap();
    assert_eq!(ops.len(), 1);
    assert!((ops[0].profit_margin - 3.7349).abs() < 0.01);

    std::fs::remove_file(&path).unwrap();
}
