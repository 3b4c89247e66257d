//! DexScreener API Client - keyless market data fallback
//!
//! Used when no Defined API key is configured. Price is taken from the
//! Ethereum pair with the highest USD liquidity; links from that pair's
//! `info` block.
//!
//! API: https://api.dexscreener.com/latest/dex/tokens/{tokenAddress}
//! Free, no API key required

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::core::traits::MarketOracle;
use crate::models::types::MarketData;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEXSCREENER_BASE_URL};
use crate::utils::rate_limiter::RateLimiter;

const ETHEREUM_CHAIN: &str = "ethereum";

/// DexScreener API response
#[derive(Debug, Deserialize)]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

/// A trading pair from DexScreener
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    /// Chain ID (e.g., "ethereum", "bsc")
    pub chain_id: String,
    pub dex_id: String,
    pub pair_address: String,
    pub liquidity: Option<DexLiquidity>,
    /// Price in USD, as a decimal string
    pub price_usd: Option<String>,
    pub info: Option<DexPairInfo>,
}

impl DexPair {
    fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    fn links(&self) -> Vec<String> {
        let Some(info) = &self.info else {
            return Vec::new();
        };
        info.websites
            .iter()
            .chain(info.socials.iter())
            .map(|l| l.url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexLiquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DexPairInfo {
    #[serde(default)]
    pub websites: Vec<DexLink>,
    #[serde(default)]
    pub socials: Vec<DexLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexLink {
    pub url: String,
}

/// DexScreener API client
pub struct DexScreenerClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    limiter: Option<Arc<RateLimiter>>,
}

impl Default for DexScreenerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DexScreenerClient {
    pub fn new() -> Self {
        Self::with_base_url(DEXSCREENER_BASE_URL)
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

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Ethereum pairs for a token, highest liquidity first
    pub async fn get_token_pairs(&self, token: Address) -> Result<Vec<DexPair>> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        let url = format!("{}/tokens/{}", self.base_url, token);
        info!("🔍 DexScreener: Fetching pairs for {}", token);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| eyre!("DexScreener request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("DexScreener API error: {}", response.status()));
        }

        let data: DexScreenerResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse DexScreener response: {}", e))?;

        let mut pairs: Vec<DexPair> = data
            .pairs
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.chain_id.eq_ignore_ascii_case(ETHEREUM_CHAIN))
            .collect();

        pairs.sort_by(|a, b| {
            b.liquidity_usd()
                .partial_cmp(&a.liquidity_usd())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!("📊 DexScreener: Found {} pairs", pairs.len());
        Ok(pairs)
    }
}

#[async_trait]
impl MarketOracle for DexScreenerClient {
    fn name(&self) -> &'static str {
        "dexscreener"
    }

    async fn market_data(&self, token: Address) -> Result<MarketData> {
        let pairs = self.get_token_pairs(token).await?;
        let Some(best) = pairs.first() else {
            return Ok(MarketData::default());
        };

        Ok(MarketData {
            price_usd: best.price_usd.as_deref().and_then(|p| p.parse().ok()),
            links: best.links(),
            ..Default::default()
        })
    }
}
