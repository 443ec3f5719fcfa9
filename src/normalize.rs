//! Odds normalizer.
//!
//! Turns one raw feed event payload into canonical records: an `Event`
//! row, the `Bookmaker`s sighted on it, and a flat list of
//! `MarketQuote`s. Prices must be decimal odds strictly greater than
//! 1.0 — anything else cannot represent a bettable price and would
//! corrupt implied-probability math downstream, so it is rejected
//! (logged, never fatal). Unsupported market keys are ignored.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::feed::EventPayload;
use crate::types::{Bookmaker, Event, MarketKind, MarketQuote};

/// Canonical output of normalizing one event payload.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub event: Event,
    pub bookmakers: Vec<Bookmaker>,
    pub quotes: Vec<MarketQuote>,
    /// Quotes discarded for unusable prices or missing lines.
    pub rejected_quotes: usize,
}

/// Normalize a raw event payload into canonical records.
///
/// `now` decides the live flag (events that have already commenced are
/// in-play) and stamps each quote's capture time.
pub fn normalize_event(payload: &EventPayload, now: DateTime<Utc>) -> NormalizedEvent {
    let event_key = Event::natural_key(
        &payload.id,
        &payload.sport_key,
        &payload.home_team,
        &payload.away_team,
    );

    let event = Event {
        event_key: event_key.clone(),
        sport_key: payload.sport_key.clone(),
        sport_title: payload.sport_title.clone(),
        home_team: payload.home_team.clone(),
        away_team: payload.away_team.clone(),
        commence_time: payload.commence_time,
        is_live: payload.commence_time <= now,
    };

    let mut bookmakers: Vec<Bookmaker> = Vec::new();
    let mut quotes: Vec<MarketQuote> = Vec::new();
    let mut rejected = 0usize;

    for bm in &payload.bookmakers {
        if !bookmakers.iter().any(|b| b.key == bm.key) {
            bookmakers.push(Bookmaker {
                key: bm.key.clone(),
                title: bm.title.clone(),
            });
        }

        for market in &bm.markets {
            let Some(kind) = MarketKind::from_key(&market.key) else {
                // Forward-compatible ignore policy for unknown markets
                debug!(market_key = %market.key, "Unsupported market key, skipping");
                continue;
            };

            for outcome in &market.outcomes {
                if !outcome.price.is_finite() || outcome.price <= 1.0 {
                    warn!(
                        event = %event_key,
                        bookmaker = %bm.key,
                        outcome = %outcome.name,
                        price = outcome.price,
                        "Rejecting quote with unusable price"
                    );
                    rejected += 1;
                    continue;
                }

                let line = if kind.has_line() {
                    match outcome.point {
                        // Spread points are quoted per side (+1.5 for one
                        // team, -1.5 for the other). Store the
                        // home-oriented market line so the two sides of
                        // one handicap share a grouping key and same-sign
                        // handicaps never do.
                        Some(p) if p.is_finite() => {
                            if kind == MarketKind::Spreads && outcome.name == payload.away_team {
                                Some(-p)
                            } else {
                                Some(p)
                            }
                        }
                        _ => {
                            warn!(
                                event = %event_key,
                                bookmaker = %bm.key,
                                market = %kind,
                                outcome = %outcome.name,
                                "Rejecting line-market quote without a parseable line"
                            );
                            rejected += 1;
                            continue;
                        }
                    }
                } else {
                    None
                };

                quotes.push(MarketQuote {
                    event_key: event_key.clone(),
                    market: kind,
                    bookmaker_key: bm.key.clone(),
                    bookmaker_title: bm.title.clone(),
                    outcome: outcome.name.clone(),
                    price: outcome.price,
                    line,
                    captured_at: now,
                });
            }
        }
    }

    NormalizedEvent {
        event,
        bookmakers,
        quotes,
        rejected_quotes: rejected,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
