//! Type definitions for pairscope
//! Core data structures flowing from chain reads and oracles into a report

use alloy_primitives::{Address, Bytes, B256, I256, U256};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ============================================
// Pool identity
// ============================================

/// Exchange protocol a pool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PoolKind {
    #[serde(rename = "uniswap-v2")]
    UniswapV2,
    #[serde(rename = "uniswap-v3")]
    UniswapV3,
}

impl PoolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::UniswapV2 => "uniswap-v2",
            PoolKind::UniswapV3 => "uniswap-v3",
        }
    }

    /// Human-readable protocol name used in client-facing messages
    pub fn protocol_name(&self) -> &'static str {
        match self {
            PoolKind::UniswapV2 => "Uniswap V2",
            PoolKind::UniswapV3 => "Uniswap V3",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of an asset inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSide {
    Token0,
    Token1,
}

impl AssetSide {
    pub fn other(self) -> Self {
        match self {
            AssetSide::Token0 => AssetSide::Token1,
            AssetSide::Token1 => AssetSide::Token0,
        }
    }
}

/// Resolved pool: both assets plus which one is the reference asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolIdentity {
    pub pool: Address,
    pub kind: PoolKind,
    pub token0: Address,
    pub token1: Address,
    pub reference_side: AssetSide,
    /// Fee tier in hundredths of a bip (fee-tiered pools only)
    pub fee: Option<u32>,
}

impl PoolIdentity {
    /// Resolve which side holds `reference`; None when neither does
    pub fn resolve(
        pool: Address,
        kind: PoolKind,
        token0: Address,
        token1: Address,
        reference: Address,
        fee: Option<u32>,
    ) -> Option<Self> {
        let reference_side = if token0 == reference {
            AssetSide::Token0
        } else if token1 == reference {
            AssetSide::Token1
        } else {
            return None;
        };
        Some(Self {
            pool,
            kind,
            token0,
            token1,
            reference_side,
            fee,
        })
    }

    fn asset(&self, side: AssetSide) -> Address {
        match side {
            AssetSide::Token0 => self.token0,
            AssetSide::Token1 => self.token1,
        }
    }

    /// The non-reference asset being reported on
    pub fn token(&self) -> Address {
        self.asset(self.reference_side.other())
    }

    pub fn reference(&self) -> Address {
        self.asset(self.reference_side)
    }
}

/// Chain head as seen by one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRef {
    pub number: u64,
    pub timestamp: u64,
}

/// Reserves of both pool assets at a block. Never mutated after the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub reserve0: U256,
    pub reserve1: U256,
    pub block: u64,
}

impl ReserveSnapshot {
    pub fn reserve(&self, side: AssetSide) -> U256 {
        match side {
            AssetSide::Token0 => self.reserve0,
            AssetSide::Token1 => self.reserve1,
        }
    }
}

// ============================================
// Raw chain logs
// ============================================

/// Log query over an inclusive block range. `None` topics are wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<Option<B256>>,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogFilter {
    pub fn new(address: Address, topic0: B256, from_block: u64, to_block: u64) -> Self {
        Self {
            address,
            topics: vec![Some(topic0)],
            from_block,
            to_block,
        }
    }

    /// Constrain an indexed argument (position 1..=3)
    pub fn with_topic(mut self, position: usize, topic: B256) -> Self {
        if self.topics.len() <= position {
            self.topics.resize(position + 1, None);
        }
        self.topics[position] = Some(topic);
        self
    }

    /// Same filter over another range
    pub fn with_range(&self, from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            ..self.clone()
        }
    }
}

/// Undecoded log as returned by the chain client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
}

// ============================================
// Event-derived data
// ============================================

/// One swap, as signed balance changes on the pool side.
/// Positive means the pool received the asset, negative means it paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapEvent {
    pub block_number: u64,
    pub log_index: u64,
    pub delta0: I256,
    pub delta1: I256,
}

impl SwapEvent {
    /// Whether the pool paid out the asset on `side`
    pub fn pays_out(&self, side: AssetSide) -> bool {
        match side {
            AssetSide::Token0 => self.delta0.is_negative(),
            AssetSide::Token1 => self.delta1.is_negative(),
        }
    }
}

/// Trade counts over the trailing window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TradeCounts {
    pub buys: u64,
    pub sells: u64,
}

// ============================================
// Locks
// ============================================

/// Which registry a lock came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockSource {
    Unicrypt,
    TeamFinance,
    Burn,
}

/// Pool shares made inaccessible until `unlocks` (never, for burns)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockRecord {
    pub locker: LockSource,
    #[serde(serialize_with = "serialize_decimal")]
    pub amount: U256,
    /// Unix seconds; None for burned shares
    pub unlocks: Option<u64>,
    /// Share of total pool supply in [0, 1], four decimal places
    pub percent: f64,
}

fn serialize_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

// ============================================
// Oracle data
// ============================================

/// Simulated trade outcome from a security oracle. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityAssessment {
    pub buy_tax: Option<f64>,
    pub sell_tax: Option<f64>,
    pub buy_gas: Option<u64>,
    pub sell_gas: Option<u64>,
    pub max_buy: Option<f64>,
    pub max_sell: Option<f64>,
    pub is_honeypot: Option<bool>,
}

/// Market view of a token
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketData {
    pub price_usd: Option<f64>,
    pub holder_count: Option<u64>,
    pub is_scam: Option<bool>,
    pub links: Vec<String>,
}

/// ERC-20 metadata read straight from the token contract
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Option<U256>,
    pub owner: Option<Address>,
}

// ============================================
// Provenance
// ============================================

/// A value plus whether it came from its source or is a documented fallback
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Fresh(T),
    Degraded { fallback: T, reason: String },
}

impl<T> Sourced<T> {
    pub fn degraded(fallback: T, reason: impl Into<String>) -> Self {
        Sourced::Degraded {
            fallback,
            reason: reason.into(),
        }
    }

    /// Fresh on Ok, otherwise the fallback tagged with `reason`. The error
    /// itself is not kept; callers log it.
    pub fn from_result<E>(result: Result<T, E>, fallback: T, reason: impl Into<String>) -> Self {
        match result {
            Ok(value) => Sourced::Fresh(value),
            Err(_) => Sourced::degraded(fallback, reason),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Sourced::Fresh(v) => v,
            Sourced::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Sourced::Fresh(v) => v,
            Sourced::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Sourced::Fresh(_))
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            Sourced::Fresh(_) => Provenance::ok(),
            Sourced::Degraded { reason, .. } => Provenance::degraded(reason.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceStatus {
    Ok,
    Degraded,
}

/// Per-field-group confidence exposed on the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub status: ProvenanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Provenance {
    pub fn ok() -> Self {
        Self {
            status: ProvenanceStatus::Ok,
            reason: None,
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            status: ProvenanceStatus::Degraded,
            reason: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ProvenanceStatus::Ok
    }
}

// ============================================
// Report
// ============================================

/// Optional behaviour requested per report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFlags {
    pub count_trades: bool,
}

/// The consolidated answer for one pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenReport {
    pub pool_type: PoolKind,
    pub pool_address: Address,
    pub token_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_fee: Option<u32>,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub token_supply: Option<f64>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub pooled_eth: f64,
    pub pooled_eth_initial: Option<f64>,
    pub current_liquidity: Option<f64>,
    pub pool_growth: Option<f64>,
    pub token_holders: Option<u64>,
    pub buys_24h: u64,
    pub sells_24h: u64,
    pub trades_truncated: bool,
    pub buy_tax: Option<f64>,
    pub sell_tax: Option<f64>,
    pub buy_gas: Option<u64>,
    pub sell_gas: Option<u64>,
    pub max_buy: Option<f64>,
    pub max_sell: Option<f64>,
    pub owner: Option<Address>,
    pub is_honeypot: Option<bool>,
    pub is_scam: Option<bool>,
    pub verified: bool,
    pub renounced: bool,
    pub links: Vec<String>,
    pub locks: Vec<LockRecord>,
    pub provenance: BTreeMap<&'static str, Provenance>,
}
