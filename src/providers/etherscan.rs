//! Etherscan verified source lookup
//!
//! API: {base}/api?module=contract&action=getsourcecode&address={addr}&apikey={key}

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::traits::SourceCodeProvider;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_SECS, ETHERSCAN_BASE_URL};
use crate::utils::rate_limiter::RateLimiter;

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    /// Array of entries on success, an error string otherwise
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceEntry {
    #[serde(default)]
    source_code: String,
}

/// Etherscan API client
pub struct EtherscanClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    api_key: String,
    limiter: Option<Arc<RateLimiter>>,
}

impl EtherscanClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(ETHERSCAN_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            api_key: api_key.into(),
            limiter: None,
        }
    }

    /// Per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }
}

#[async_trait]
impl SourceCodeProvider for EtherscanClient {
    async fn source_code(&self, address: Address) -> Result<Option<String>> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        let url = format!("{}/api", self.base_url);
        info!("📜 Etherscan: source code for {}", address);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", &address.to_string()),
                ("apikey", &self.api_key),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| eyre!("Etherscan request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Etherscan API error: {}", response.status()));
        }

        let body: EtherscanResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse Etherscan response: {}", e))?;

        if body.status != "1" {
            return Err(eyre!("Etherscan error: {} ({})", body.message, body.result));
        }

        let entries: Vec<SourceEntry> = serde_json::from_value(body.result)
            .map_err(|e| eyre!("Unexpected Etherscan result shape: {}", e))?;
        let source = entries
            .into_iter()
            .next()
            .map(|entry| entry.source_code)
            .filter(|code| !code.is_empty());

        debug!(verified = source.is_some(), "Etherscan source lookup");
        Ok(source)
    }
}
