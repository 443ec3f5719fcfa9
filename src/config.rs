//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the odds API key) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub feed: FeedConfig,
    pub quota: QuotaConfig,
    pub collector: CollectorSettings,
    pub detection: DetectionSettings,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    pub name: String,
    /// Seconds between scheduled sweeps.
    pub sweep_interval_secs: u64,
    /// Bankroll used by the stake endpoint when the caller omits one.
    pub default_bankroll: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Env var holding The Odds API key.
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Comma-separated bookmaker regions, e.g. "uk,eu".
    pub regions: String,
    /// Sports to sweep, in priority order.
    pub target_sports: Vec<String>,
}

fn default_base_url() -> String {
    "https://api.the-odds-api.com/v4".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuotaConfig {
    /// External API requests allowed per rolling month.
    pub max_requests_month: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorSettings {
    /// Cap on events processed per sport per sweep.
    pub max_events_per_sport: usize,
    /// Wall-clock budget for one sweep, in seconds.
    pub time_budget_secs: u64,
    /// How far into the past an event may have started and still be
    /// collected (in-play window). 0 = strictly upcoming only.
    pub lookback_minutes: i64,
    /// How far into the future an event may start and still be collected.
    pub lookahead_minutes: i64,
    /// Opportunities older than this are pruned at sweep start.
    pub retention_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionSettings {
    /// Implied-probability cutoff for pre-match markets.
    pub prematch_threshold: f64,
    /// Stricter cutoff for live markets (odds move before both legs land).
    pub live_threshold: f64,
    /// Require each leg of an opportunity to come from a different
    /// bookmaker. Off by default — the detector only forbids reusing
    /// the same quote row.
    #[serde(default)]
    pub require_distinct_bookmakers: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
