//! LINEHAWK — sports-betting arbitrage scanner.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the store snapshot from disk (or starts fresh), and runs
//! the scheduled sweep loop with graceful shutdown.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use linehawk::api::routes::ApiState;
use linehawk::api::spawn_api;
use linehawk::collector::{QuotaLedger, Sweeper};
use linehawk::config::AppConfig;
use linehawk::detect::{ArbitrageDetector, DetectorConfig};
use linehawk::feed::the_odds_api::TheOddsApiClient;
use linehawk::scheduler::Scheduler;
use linehawk::store::{MemoryStore, QuoteStore};

const BANNER: &str = r#"
 _     ___ _   _ _____ _   _    ___        ___  __
| |   |_ _| \ | | ____| | | |  / \ \      / / |/ /
| |    | ||  \| |  _| | |_| | / _ \ \ /\ / /| ' /
| |___ | || |\  | |___|  _  |/ ___ \ V  V / | . \
|_____|___|_| \_|_____|_| |_/_/   \_\_/\_/  |_|\_\

  Cross-bookmaker arbitrage scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        scanner_name = %cfg.scanner.name,
        sweep_interval_secs = cfg.scanner.sweep_interval_secs,
        target_sports = cfg.feed.target_sports.len(),
        quota = cfg.quota.max_requests_month,
        "LINEHAWK starting up"
    );

    // -- Restore or create state -----------------------------------------

    let store = Arc::new(MemoryStore::load(None)?);

    // -- Initialise components -------------------------------------------

    let api_key = AppConfig::resolve_env(&cfg.feed.api_key_env)?;
    let feed = TheOddsApiClient::new(api_key.into(), Some(cfg.feed.base_url.clone()))?;

    let quota = Arc::new(QuotaLedger::new(cfg.quota.max_requests_month));
    let detector = ArbitrageDetector::new(DetectorConfig::from(&cfg.detection));

    let sweeper = Arc::new(Sweeper::new(
        Arc::new(feed),
        store.clone() as Arc<dyn QuoteStore>,
        quota.clone(),
        detector,
        cfg.feed.clone(),
        cfg.collector.clone(),
    ));
    let scheduler = Arc::new(Scheduler::new(sweeper, cfg.scanner.sweep_interval_secs));

    if cfg.api.enabled {
        let state = Arc::new(ApiState {
            store: store.clone() as Arc<dyn QuoteStore>,
            scheduler: scheduler.clone(),
            quota: quota.clone(),
            default_bankroll: cfg.scanner.default_bankroll,
        });
        spawn_api(state, cfg.api.port)?;
    }

    // -- Main loop -------------------------------------------------------

    info!(
        interval_secs = cfg.scanner.sweep_interval_secs,
        "Entering sweep loop. Press Ctrl+C to stop."
    );

    scheduler
        .run_loop(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    // Save final snapshot
    if let Err(e) = store.save(None) {
        error!(error = %e, "Failed to save store snapshot");
    }
    info!(
        quota_used = quota.used(),
        quota_remaining = quota.remaining(),
        "LINEHAWK shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linehawk=info"));

    let json_logging = std::env::var("LINEHAWK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
