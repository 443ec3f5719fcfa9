//! Sweep orchestrator.
//!
//! Drives one collection pass: prune stale opportunities, then walk the
//! configured sports in priority order, fetching odds, normalizing,
//! grouping, detecting, and persisting. Two hard ceilings shape every
//! sweep: a monthly request quota on the external feed and a wall-clock
//! budget per sweep. The sweep degrades by doing less, never by
//! exceeding either ceiling.
//!
//! Failures are scoped: a bad sport, event, or store write is logged
//! and skipped, and the sweep carries on with everything else.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use tracing::{error, info, warn};

use crate::config::{CollectorSettings, FeedConfig};
use crate::detect::ArbitrageDetector;
use crate::error::SweepError;
use crate::feed::{EventPayload, OddsFeed};
use crate::grouping::group_by_line;
use crate::normalize::normalize_event;
use crate::store::QuoteStore;
use crate::types::{MarketKind, MarketQuote, SweepSummary};

// ---------------------------------------------------------------------------
// Quota ledger
// ---------------------------------------------------------------------------

/// Tracks external feed requests against the monthly allowance.
///
/// `try_acquire` is a single atomic check-then-increment, so concurrent
/// callers can never jointly overshoot the cap.
pub struct QuotaLedger {
    used: AtomicU32,
    max: u32,
}

impl QuotaLedger {
    pub fn new(max: u32) -> Self {
        Self::with_used(max, 0)
    }

    /// Resume with a prior usage count (e.g. restored from a snapshot).
    pub fn with_used(max: u32, used: u32) -> Self {
        Self {
            used: AtomicU32::new(used),
            max,
        }
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used())
    }

    /// Reserve one request unit, or fail without consuming anything.
    pub fn try_acquire(&self) -> Result<u32, SweepError> {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.max).then_some(used + 1)
            })
            .map(|prev| prev + 1)
            .map_err(|used| SweepError::QuotaExceeded {
                used,
                max: self.max,
            })
    }
}

// ---------------------------------------------------------------------------
// Sweeper
// ---------------------------------------------------------------------------

pub struct Sweeper {
    feed: Arc<dyn OddsFeed>,
    store: Arc<dyn QuoteStore>,
    quota: Arc<QuotaLedger>,
    detector: ArbitrageDetector,
    feed_cfg: FeedConfig,
    settings: CollectorSettings,
}

impl Sweeper {
    pub fn new(
        feed: Arc<dyn OddsFeed>,
        store: Arc<dyn QuoteStore>,
        quota: Arc<QuotaLedger>,
        detector: ArbitrageDetector,
        feed_cfg: FeedConfig,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            feed,
            store,
            quota,
            detector,
            feed_cfg,
            settings,
        }
    }

    pub fn quota(&self) -> &QuotaLedger {
        &self.quota
    }

    /// Execute one full sweep over the configured sports.
    ///
    /// Fails fast with `QuotaExceeded` when the allowance is already
    /// spent — before any network call. Quota or budget exhaustion
    /// mid-sweep ends the pass early with a partial (honest) summary.
    pub async fn run_sweep(&self) -> Result<SweepSummary, SweepError> {
        let clock = Instant::now();
        let now = Utc::now();
        let budget = Duration::from_secs(self.settings.time_budget_secs);

        let mut summary = SweepSummary {
            started_at: Some(now),
            ..SweepSummary::default()
        };

        // Stale findings go first so a budget-starved sweep still cleans up
        let cutoff = now - ChronoDuration::hours(self.settings.retention_hours);
        match self.store.prune_opportunities(cutoff) {
            Ok(removed) if removed > 0 => info!(removed, "Pruned stale opportunities"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Opportunity pruning failed, continuing"),
        }

        if self.quota.remaining() == 0 {
            return Err(SweepError::QuotaExceeded {
                used: self.quota.used(),
                max: self.quota.max(),
            });
        }

        let window_start = now - ChronoDuration::minutes(self.settings.lookback_minutes);
        let window_end = now + ChronoDuration::minutes(self.settings.lookahead_minutes);
        let markets = MarketKind::all().map(|m| m.key()).join(",");

        let sports = self.resolve_sports(&clock, budget, &mut summary).await?;
        for (idx, sport_key) in sports.iter().enumerate() {
            if clock.elapsed() >= budget {
                warn!(
                    sport = %sport_key,
                    elapsed_ms = clock.elapsed().as_millis() as u64,
                    "Time budget exhausted, ending sweep early"
                );
                summary.budget_exhausted = true;
                summary.sports_skipped += sports.len() - idx;
                break;
            }

            match self.quota.try_acquire() {
                Ok(used) => {
                    info!(sport = %sport_key, quota_used = used, "Fetching odds");
                }
                Err(SweepError::QuotaExceeded { used, max }) => {
                    warn!(used, max, "Request quota exhausted mid-sweep");
                    summary.sports_skipped += sports.len() - idx;
                    break;
                }
                Err(e) => return Err(e),
            }

            let events = match self
                .feed
                .fetch_odds(sport_key, &self.feed_cfg.regions, &markets)
                .await
            {
                Ok(events) => events,
                Err(e) => {
                    error!(sport = %sport_key, error = %e, "Odds fetch failed, skipping sport");
                    summary.sports_skipped += 1;
                    continue;
                }
            };

            let eligible: Vec<&EventPayload> = events
                .iter()
                .filter(|ev| ev.commence_time >= window_start && ev.commence_time <= window_end)
                .take(self.settings.max_events_per_sport)
                .collect();

            info!(
                sport = %sport_key,
                fetched = events.len(),
                eligible = eligible.len(),
                "Processing events"
            );

            for payload in eligible {
                match self.process_event(payload, &mut summary) {
                    Ok(()) => summary.events_processed += 1,
                    Err(e) => {
                        error!(
                            sport = %sport_key,
                            home = %payload.home_team,
                            away = %payload.away_team,
                            error = %e,
                            "Event processing failed, skipping event"
                        );
                    }
                }
            }

            summary.sports_completed += 1;
        }

        summary.elapsed_ms = clock.elapsed().as_millis() as u64;
        info!(
            events = summary.events_processed,
            markets = summary.markets_processed,
            opportunities = summary.opportunities_found,
            sports_completed = summary.sports_completed,
            sports_skipped = summary.sports_skipped,
            budget_exhausted = summary.budget_exhausted,
            elapsed_ms = summary.elapsed_ms,
            "Sweep complete"
        );
        Ok(summary)
    }

    /// Fetch the sport catalogue and validate the configured targets
    /// against it, preserving the configured priority order.
    ///
    /// Targets missing from the catalogue or marked inactive are
    /// skipped for this sweep. A catalogue fetch failure falls back to
    /// the configured list unfiltered — the per-sport odds fetch is the
    /// next line of defence.
    async fn resolve_sports(
        &self,
        clock: &Instant,
        budget: Duration,
        summary: &mut SweepSummary,
    ) -> Result<Vec<String>, SweepError> {
        let mut sports = self.feed_cfg.target_sports.clone();

        if clock.elapsed() >= budget {
            warn!("Time budget exhausted before the catalogue fetch");
            summary.budget_exhausted = true;
            summary.sports_skipped = sports.len();
            return Ok(Vec::new());
        }

        let used = self.quota.try_acquire()?;
        info!(quota_used = used, "Fetching sport catalogue");

        match self.feed.fetch_sports().await {
            Ok(catalogue) => {
                sports.retain(|key| match catalogue.iter().find(|s| &s.key == key) {
                    Some(s) if s.active => true,
                    Some(_) => {
                        warn!(sport = %key, "Sport inactive in catalogue, skipping");
                        summary.sports_skipped += 1;
                        false
                    }
                    None => {
                        warn!(sport = %key, "Sport not in catalogue, skipping");
                        summary.sports_skipped += 1;
                        false
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "Catalogue fetch failed, using configured sport list");
            }
        }

        Ok(sports)
    }

    /// Normalize, persist, and scan one event across all market kinds.
    fn process_event(&self, payload: &EventPayload, summary: &mut SweepSummary) -> Result<()> {
        let normalized = normalize_event(payload, Utc::now());
        if normalized.rejected_quotes > 0 {
            warn!(
                event = %normalized.event.event_key,
                rejected = normalized.rejected_quotes,
                "Some quotes were rejected during normalization"
            );
        }

        self.store
            .upsert_event(&normalized.event)
            .context("Failed to upsert event")?;
        self.store
            .upsert_bookmakers(&normalized.bookmakers)
            .context("Failed to upsert bookmakers")?;

        for market in MarketKind::all() {
            let quotes: Vec<MarketQuote> = normalized
                .quotes
                .iter()
                .filter(|q| q.market == market)
                .cloned()
                .collect();
            if quotes.is_empty() {
                continue;
            }

            self.store
                .replace_quotes(&normalized.event.event_key, market, quotes.clone())
                .with_context(|| format!("Failed to replace {market} quotes"))?;
            summary.markets_processed += 1;

            let mut found = Vec::new();
            for group in group_by_line(&quotes) {
                found.extend(self.detector.detect(&normalized.event, &group));
            }
            summary.opportunities_found += found.len();

            self.store
                .replace_opportunities(&normalized.event.event_key, market, found)
                .with_context(|| format!("Failed to replace {market} opportunities"))?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
