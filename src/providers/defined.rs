//! Defined.fi market data oracle (GraphQL)
//!
//! Price comes from `getTokenPrices`, scam flag and social links from
//! `getTokenInfo`. The two queries run concurrently and either may fail
//! without losing the other.

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::value_as_f64;
use crate::core::traits::MarketOracle;
use crate::models::types::MarketData;
use crate::utils::constants::{CHAIN_ID_ETHEREUM, DEFAULT_HTTP_TIMEOUT_SECS, DEFINED_BASE_URL};
use crate::utils::rate_limiter::RateLimiter;

const TOKEN_PRICE_QUERY: &str = r#"query($address: String!, $networkId: Int!) {
  getTokenPrices(inputs: [{ address: $address, networkId: $networkId }]) {
    priceUsd
  }
}"#;

const TOKEN_INFO_QUERY: &str = r#"query($address: String!, $networkId: Int!) {
  getTokenInfo(address: $address, networkId: $networkId) {
    circulatingSupply
    isScam
    links {
      discord email facebook github instagram linkedin reddit slack
      telegram twitch twitter website wechat whitepaper youtube
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPricesData {
    get_token_prices: Vec<Option<TokenPrice>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPrice {
    price_usd: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenInfoData {
    get_token_info: Option<TokenInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenInfo {
    is_scam: Option<bool>,
    links: Option<serde_json::Map<String, Value>>,
}

/// Defined.fi GraphQL client
pub struct DefinedClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    api_key: String,
    limiter: Option<Arc<RateLimiter>>,
}

impl DefinedClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFINED_BASE_URL, api_key)
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

    async fn query<T: DeserializeOwned>(&self, query: &str, token: Address) -> Result<T> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        let response = self
            .client
            .post(&self.base_url)
            .header("X-Api-Key", &self.api_key)
            .json(&json!({
                "query": query,
                "variables": { "address": token.to_string(), "networkId": CHAIN_ID_ETHEREUM },
            }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| eyre!("Defined request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Defined API error: {}", response.status()));
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse Defined response: {}", e))?;

        match (body.data, body.errors.first()) {
            (Some(data), _) => Ok(data),
            (None, Some(err)) => Err(eyre!("Defined GraphQL error: {}", err.message)),
            (None, None) => Err(eyre!("Defined returned no data")),
        }
    }

    /// USD price, None when the token has no price
    pub async fn price_usd(&self, token: Address) -> Result<Option<f64>> {
        let data: TokenPricesData = self.query(TOKEN_PRICE_QUERY, token).await?;
        Ok(data
            .get_token_prices
            .into_iter()
            .flatten()
            .next()
            .and_then(|p| p.price_usd)
            .as_ref()
            .and_then(value_as_f64))
    }

    /// Scam flag and non-empty social links
    pub async fn token_info(&self, token: Address) -> Result<(Option<bool>, Vec<String>)> {
        let data: TokenInfoData = self.query(TOKEN_INFO_QUERY, token).await?;
        let info = data
            .get_token_info
            .ok_or_else(|| eyre!("Defined has no token info for {}", token))?;
        let links = info
            .links
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(_, v)| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect();
        Ok((info.is_scam, links))
    }
}

#[async_trait]
impl MarketOracle for DefinedClient {
    fn name(&self) -> &'static str {
        "defined"
    }

    async fn market_data(&self, token: Address) -> Result<MarketData> {
        info!("📈 Defined: market data for {}", token);
        let (price, token_info) = tokio::join!(self.price_usd(token), self.token_info(token));

        let mut data = MarketData::default();
        match (price, token_info) {
            (Err(price_err), Err(info_err)) => {
                return Err(eyre!("price: {}; info: {}", price_err, info_err));
            }
            (price, token_info) => {
                match price {
                    Ok(p) => data.price_usd = p,
                    Err(e) => warn!("⚠️ Defined price lookup failed: {}", e),
                }
                match token_info {
                    Ok((is_scam, links)) => {
                        data.is_scam = is_scam;
                        data.links = links;
                    }
                    Err(e) => warn!("⚠️ Defined token info lookup failed: {}", e),
                }
            }
        }
        Ok(data)
    }
}
