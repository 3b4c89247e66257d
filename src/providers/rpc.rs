//! RPC Client Module - JSON-RPC over HTTP
//!
//! 1. One endpoint per process (Alchemy URL or any `ETH_HTTP_URL`)
//! 2. No automatic retries: the only divide-and-retry lives in the log fetcher
//! 3. User-Agent header on every request
//! 4. Gzip compression for large `eth_getLogs` responses
//! 5. Upstream JSON-RPC errors surface as a typed `RpcError` inside the
//!    `eyre::Report`, so callers can `downcast_ref` and classify them

use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use eyre::{eyre, Result};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::core::traits::ChainClient;
use crate::models::types::{BlockRef, LogFilter, RawLog};
use crate::utils::constants::{RPC_RANGE_TOO_LARGE, RPC_RATE_LIMITED, USER_AGENT as USER_AGENT_CONST};

lazy_static! {
    /// Providers that reject a log range often suggest one that works: `[0x1, 0x2]`
    static ref SUGGESTED_RANGE: Regex = Regex::new(r"\[([^\s,]+),\s+([^\s\]]+)\]")
        .expect("static regex");
}

/// RPC Provider
#[derive(Clone)]
pub struct RpcProvider {
    url: String,
    /// HTTP client with custom headers (gzip enabled)
    client: reqwest::Client,
}

impl RpcProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            client: Self::build_client(timeout)?,
        })
    }

    fn build_client(timeout: Duration) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
    }

    /// Execute a single JSON-RPC call
    pub async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| eyre!("Request failed: {}", e))?;

        let status = response.status();
        if status == 429 {
            return Err(eyre!("Rate limited (HTTP 429)"));
        }
        if !status.is_success() {
            return Err(eyre!("HTTP error: {}", status));
        }

        let json: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse response: {}", e))?;

        if let Some(error) = json.error {
            debug!(method, code = error.code, "RPC error: {}", error.message);
            return Err(eyre::Report::new(error));
        }

        json.result.ok_or_else(|| eyre!("No result in response"))
    }
}

#[async_trait]
impl ChainClient for RpcProvider {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let params = serde_json::json!([{ "to": to, "data": data }, "latest"]);
        self.request::<Bytes>("eth_call", params).await
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>> {
        let topics: Vec<Option<B256>> = filter.topics.clone();
        let params = serde_json::json!([{
            "address": filter.address,
            "topics": topics,
            "fromBlock": format!("0x{:x}", filter.from_block),
            "toBlock": format!("0x{:x}", filter.to_block),
        }]);
        let logs: Vec<RpcLog> = self.request("eth_getLogs", params).await?;
        logs.into_iter().map(RpcLog::into_raw).collect()
    }

    async fn latest_block(&self) -> Result<BlockRef> {
        let params = serde_json::json!(["latest", false]);
        let block: Option<RpcBlock> = self.request("eth_getBlockByNumber", params).await?;
        let block = block.ok_or_else(|| eyre!("Latest block unavailable"))?;
        Ok(BlockRef {
            number: block.number.to::<u64>(),
            timestamp: block.timestamp.to::<u64>(),
        })
    }
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    block_number: Option<U64>,
    log_index: Option<U64>,
}

impl RpcLog {
    fn into_raw(self) -> Result<RawLog> {
        // Pending logs have no block; a bounded historical query never returns them
        let block_number = self
            .block_number
            .ok_or_else(|| eyre!("Log without block number"))?
            .to::<u64>();
        Ok(RawLog {
            address: self.address,
            topics: self.topics,
            data: self.data,
            block_number,
            log_index: self.log_index.map(|i| i.to::<u64>()).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    number: U64,
    timestamp: U64,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Check if this is a rate limit error (code -32005)
    pub fn is_rate_limit(&self) -> bool {
        self.code == RPC_RATE_LIMITED || self.message.to_lowercase().contains("rate limit")
    }

    /// Log query rejected because its block range is too large (code -32602)
    pub fn is_range_too_large(&self) -> bool {
        self.code == RPC_RANGE_TOO_LARGE
    }

    /// Block range the provider suggests instead, if the message names one
    pub fn suggested_range(&self) -> Option<(u64, u64)> {
        let caps = SUGGESTED_RANGE.captures(&self.message)?;
        let from = parse_block_number(caps.get(1)?.as_str())?;
        let to = parse_block_number(caps.get(2)?.as_str())?;
        (from <= to).then_some((from, to))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC error: {} (code: {})", self.message, self.code)
    }
}

impl std::error::Error for RpcError {}

/// The typed upstream error inside a report, if there is one
pub fn rpc_error(err: &eyre::Report) -> Option<&RpcError> {
    err.downcast_ref::<RpcError>()
}

/// Whether `err` is a range-too-large log rejection
pub fn is_range_too_large(err: &eyre::Report) -> bool {
    rpc_error(err).is_some_and(RpcError::is_range_too_large)
}

fn parse_block_number(raw: &str) -> Option<u64> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
