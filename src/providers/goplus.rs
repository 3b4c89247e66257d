//! GoPlus token security oracle
//!
//! Free tier allows roughly 30 calls per minute, so every request waits on
//! the shared `RateLimiter` first.
//! API: https://api.gopluslabs.io/api/v1/token_security/1?contract_addresses={token}

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::value_as_f64;
use crate::core::traits::SecurityOracle;
use crate::models::types::SecurityAssessment;
use crate::utils::constants::{CHAIN_ID_ETHEREUM, DEFAULT_HTTP_TIMEOUT_SECS, GOPLUS_BASE_URL};
use crate::utils::rate_limiter::RateLimiter;

/// GoPlus response codes accepted as usable
const CODE_SUCCESS: i64 = 1;
const CODE_PARTIAL_DATA: i64 = 2;

#[derive(Debug, Deserialize)]
struct TokenSecurityResponse {
    code: i64,
    #[serde(default)]
    message: String,
    result: Option<HashMap<String, TokenSecurity>>,
}

/// GoPlus encodes numbers and booleans as strings ("0.05", "1")
#[derive(Debug, Default, Deserialize)]
struct TokenSecurity {
    buy_tax: Option<Value>,
    sell_tax: Option<Value>,
    is_honeypot: Option<Value>,
}

impl TokenSecurity {
    fn into_assessment(self) -> SecurityAssessment {
        // Fractions on the wire, percentages in reports
        let percent = |v: Option<Value>| v.as_ref().and_then(value_as_f64).map(|f| f * 100.0);
        SecurityAssessment {
            buy_tax: percent(self.buy_tax),
            sell_tax: percent(self.sell_tax),
            is_honeypot: self.is_honeypot.as_ref().and_then(flag),
            ..Default::default()
        }
    }
}

fn flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "1" => Some(true),
        Value::String(s) if s == "0" => Some(false),
        Value::Number(n) => n.as_u64().map(|n| n == 1),
        _ => None,
    }
}

/// GoPlus API client
pub struct GoPlusClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    limiter: Arc<RateLimiter>,
}

impl GoPlusClient {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self::with_base_url(GOPLUS_BASE_URL, limiter)
    }

    pub fn with_base_url(base_url: impl Into<String>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            limiter,
        }
    }

    /// Per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SecurityOracle for GoPlusClient {
    fn name(&self) -> &'static str {
        "goplus"
    }

    async fn assess(&self, token: Address, _pool: Address) -> Result<SecurityAssessment> {
        self.limiter.acquire().await;
        debug!(live = self.limiter.count(), "GoPlus admission");

        let url = format!("{}/api/v1/token_security/{}", self.base_url, CHAIN_ID_ETHEREUM);
        info!("🛡️ GoPlus: token security for {}", token);

        let response = self
            .client
            .get(&url)
            .query(&[("contract_addresses", token.to_checksum(None))])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| eyre!("GoPlus request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("GoPlus API error: {}", response.status()));
        }

        let body: TokenSecurityResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse GoPlus response: {}", e))?;

        if body.code != CODE_SUCCESS && body.code != CODE_PARTIAL_DATA {
            return Err(eyre!("GoPlus request error {}: {}", body.code, body.message));
        }

        // Keys are lowercase addresses
        let mut result = body.result.ok_or_else(|| eyre!("GoPlus returned no result"))?;
        let key = token.to_string().to_lowercase();
        let security = result
            .remove(&key)
            .ok_or_else(|| eyre!("GoPlus has no entry for {}", token))?;

        Ok(security.into_assessment())
    }
}
