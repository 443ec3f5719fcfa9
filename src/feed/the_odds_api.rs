//! The Odds API v4 client.
//!
//! Read-only REST client for https://the-odds-api.com. Decimal odds are
//! requested explicitly so downstream implied-probability math never
//! sees American-format prices.
//!
//! Base URL: https://api.the-odds-api.com/v4
//! Auth: `apiKey` query parameter. Every call is billed against the
//! monthly request quota, so each request logs its endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{EventPayload, OddsFeed};
use crate::types::Sport;

const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// The Odds API platform client.
pub struct TheOddsApiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
}

impl TheOddsApiClient {
    /// Create a new client. `base_url` override is for tests against a
    /// local stub server.
    pub fn new(api_key: SecretString, base_url: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("LINEHAWK/0.1.0 (arbitrage-scanner)")
            .build()
            .context("Failed to build HTTP client for The Odds API")?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// GET a feed endpoint and deserialize the JSON body.
    ///
    /// `endpoint` is the path without the API key; the key is appended
    /// here and never logged.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &str) -> Result<T> {
        // Quota accounting: every billed call records endpoint + time.
        info!(endpoint, timestamp = %Utc::now().to_rfc3339(), "Feed request");

        let sep = if query.is_empty() { "" } else { "&" };
        let url = format!(
            "{}/{}?{}{}apiKey={}",
            self.base_url,
            endpoint,
            query,
            sep,
            self.api_key.expose_secret(),
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Odds API request failed: {endpoint}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Odds API error {status} on {endpoint}: {body}");
        }

        let parsed: T = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Odds API response: {endpoint}"))?;

        debug!(endpoint, "Feed response parsed");
        Ok(parsed)
    }
}

#[async_trait]
impl OddsFeed for TheOddsApiClient {
    async fn fetch_sports(&self) -> Result<Vec<Sport>> {
        self.get_json("sports", "").await
    }

    async fn fetch_odds(
        &self,
        sport_key: &str,
        regions: &str,
        markets: &str,
    ) -> Result<Vec<EventPayload>> {
        let endpoint = format!("sports/{sport_key}/odds");
        let query = format!("regions={regions}&markets={markets}&oddsFormat=decimal");
        self.get_json(&endpoint, &query).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
