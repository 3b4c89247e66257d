//! Configuration module for pairscope
//!
//! Reads everything from the environment (after `.env` is loaded by the
//! binaries). Addresses and protocol constants stay in utils/constants.rs.

use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult};
use crate::utils::constants::{
    build_alchemy_url, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOG_MAX_DEPTH, DEFAULT_LOG_MIN_SPAN,
    DEFAULT_ORACLE_DECREMENT_RATE, DEFAULT_ORACLE_RATE_THRESHOLD, TRADE_WINDOW_BLOCKS,
};

/// Which security oracle backs tax/honeypot fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityOracleKind {
    HoneypotIs,
    GoPlus,
}

impl SecurityOracleKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "honeypotis" | "honeypot.is" | "honeypot" => Some(Self::HoneypotIs),
            "goplus" => Some(Self::GoPlus),
            _ => None,
        }
    }
}

/// Sliding-window quota for rate-limited oracles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleQuota {
    pub threshold: usize,
    pub decrement_rate: f64,
}

impl Default for OracleQuota {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ORACLE_RATE_THRESHOLD,
            decrement_rate: DEFAULT_ORACLE_DECREMENT_RATE,
        }
    }
}

/// Log fetch tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFetchConfig {
    pub min_span: u64,
    pub max_depth: u32,
    pub trade_window_blocks: u64,
    /// First block searched for lock registry deposits
    pub team_finance_from_block: u64,
}

impl Default for LogFetchConfig {
    fn default() -> Self {
        Self {
            min_span: DEFAULT_LOG_MIN_SPAN,
            max_depth: DEFAULT_LOG_MAX_DEPTH,
            trade_window_blocks: TRADE_WINDOW_BLOCKS,
            team_finance_from_block: 0,
        }
    }
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,
    pub etherscan_api_key: Option<String>,
    /// With a key, market data comes from Defined; otherwise DexScreener
    pub defined_api_key: Option<String>,
    pub security_oracle: SecurityOracleKind,
    pub oracle_quota: OracleQuota,
    pub logs: LogFetchConfig,
    pub http_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Load from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rpc_url = match get("ETH_HTTP_URL") {
            Some(url) => url,
            None => match get("ALCHEMY_API_KEY").filter(|k| k != "YOUR_API_KEY") {
                Some(key) => {
                    info!("🔑 ALCHEMY_API_KEY configured (key hidden)");
                    build_alchemy_url(&key)
                }
                None => return Err(AppError::missing_api_key("ETH_HTTP_URL or ALCHEMY_API_KEY")),
            },
        };

        let security_oracle = match get("SECURITY_ORACLE") {
            Some(raw) => SecurityOracleKind::parse(&raw)
                .ok_or_else(|| AppError::invalid_config("SECURITY_ORACLE", &raw))?,
            None => SecurityOracleKind::HoneypotIs,
        };

        let defaults = OracleQuota::default();
        let oracle_quota = OracleQuota {
            threshold: parse_or(&get, "ORACLE_RATE_THRESHOLD", defaults.threshold)?,
            decrement_rate: parse_or(&get, "ORACLE_DECREMENT_RATE", defaults.decrement_rate)?,
        };
        if oracle_quota.threshold == 0 {
            return Err(AppError::invalid_config("ORACLE_RATE_THRESHOLD", "0"));
        }

        let log_defaults = LogFetchConfig::default();
        let logs = LogFetchConfig {
            min_span: parse_or(&get, "LOG_MIN_SPAN", log_defaults.min_span)?,
            max_depth: parse_or(&get, "LOG_MAX_DEPTH", log_defaults.max_depth)?,
            trade_window_blocks: parse_or(&get, "TRADE_WINDOW_BLOCKS", log_defaults.trade_window_blocks)?,
            team_finance_from_block: parse_or(
                &get,
                "TEAM_FINANCE_FROM_BLOCK",
                log_defaults.team_finance_from_block,
            )?,
        };

        let timeout_secs: u64 = parse_or(&get, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        // Railway-style PORT wins over the local-dev variable
        let port = match get("PORT").or_else(|| get("PAIRSCOPE_PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::invalid_config("PORT", &raw))?,
            None => 8080,
        };

        Ok(Self {
            rpc_url,
            etherscan_api_key: get("ETHERSCAN_API_KEY"),
            defined_api_key: get("DEFINED_API_KEY"),
            security_oracle,
            oracle_quota,
            logs,
            http_timeout: Duration::from_secs(timeout_secs),
            host: get("PAIRSCOPE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }

    /// RPC URL with any path-embedded key hidden (for logging)
    pub fn masked_rpc_url(&self) -> String {
        match self.rpc_url.split_once("/v2/") {
            Some((base, _)) => format!("{}/v2/***HIDDEN***", base),
            None => self.rpc_url.clone(),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| AppError::invalid_config(key, &raw)),
        None => Ok(default),
    }
}
