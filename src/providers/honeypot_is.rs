//! honeypot.is security oracle
//!
//! Simulated buy/sell taxes, gas and honeypot verdict.
//! API: https://api.honeypot.is/v2/IsHoneypot?address={token}&pair={pool}&chainID=1

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{value_as_f64, value_as_u64};
use crate::core::traits::SecurityOracle;
use crate::models::types::SecurityAssessment;
use crate::utils::constants::{CHAIN_ID_ETHEREUM, DEFAULT_HTTP_TIMEOUT_SECS, HONEYPOT_IS_BASE_URL};
use crate::utils::rate_limiter::RateLimiter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IsHoneypotResponse {
    honeypot_result: Option<HoneypotResult>,
    simulation_result: Option<SimulationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoneypotResult {
    is_honeypot: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulationResult {
    buy_tax: Option<Value>,
    sell_tax: Option<Value>,
    buy_gas: Option<Value>,
    sell_gas: Option<Value>,
    max_buy: Option<MaxAmount>,
    max_sell: Option<MaxAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaxAmount {
    with_token: Option<Value>,
}

impl IsHoneypotResponse {
    fn into_assessment(self) -> SecurityAssessment {
        let sim = self.simulation_result.as_ref();
        let with_token = |max: &Option<MaxAmount>| max.as_ref().and_then(|m| m.with_token.as_ref()).and_then(value_as_f64);
        SecurityAssessment {
            buy_tax: sim.and_then(|s| s.buy_tax.as_ref()).and_then(value_as_f64),
            sell_tax: sim.and_then(|s| s.sell_tax.as_ref()).and_then(value_as_f64),
            buy_gas: sim.and_then(|s| s.buy_gas.as_ref()).and_then(value_as_u64),
            sell_gas: sim.and_then(|s| s.sell_gas.as_ref()).and_then(value_as_u64),
            max_buy: sim.and_then(|s| with_token(&s.max_buy)),
            max_sell: sim.and_then(|s| with_token(&s.max_sell)),
            is_honeypot: self.honeypot_result.and_then(|h| h.is_honeypot),
        }
    }
}

/// honeypot.is API client
pub struct HoneypotIsClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    limiter: Option<Arc<RateLimiter>>,
}

impl Default for HoneypotIsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HoneypotIsClient {
    pub fn new() -> Self {
        Self::with_base_url(HONEYPOT_IS_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            limiter: None,
        }
    }

    /// Per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Gate every request through a shared quota
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }
}

#[async_trait]
impl SecurityOracle for HoneypotIsClient {
    fn name(&self) -> &'static str {
        "honeypot.is"
    }

    async fn assess(&self, token: Address, pool: Address) -> Result<SecurityAssessment> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        let url = format!("{}/v2/IsHoneypot", self.base_url);
        info!("🍯 honeypot.is: simulating {}", token);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("address", token.to_string()),
                ("pair", pool.to_string()),
                ("chainID", CHAIN_ID_ETHEREUM.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| eyre!("honeypot.is request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("honeypot.is API error: {}", response.status()));
        }

        let body: IsHoneypotResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse honeypot.is response: {}", e))?;

        Ok(body.into_assessment())
    }
}
