//! In-memory collaborators for pipeline tests

#![allow(dead_code)]

use alloy_primitives::{address, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pairscope::core::locks::{LockAggregator, LockRegistries};
use pairscope::core::log_fetcher::{BisectionLimits, LogFetcher};
use pairscope::core::traits::{
    ChainClient, MarketOracle, ReferencePriceFeed, SecurityOracle, SourceCodeProvider,
};
use pairscope::models::types::{BlockRef, LogFilter, MarketData, RawLog, SecurityAssessment};
use pairscope::providers::rpc::RpcError;
use pairscope::utils::constants::WETH;
use pairscope::Services;

pub const TOKEN: Address = address!("1111111111111111111111111111111111111111");
pub const POOL: Address = address!("2222222222222222222222222222222222222222");
pub const HEAD: BlockRef = BlockRef {
    number: 20_000_000,
    timestamp: 1_700_000_000,
};

/// Chain keyed by `(to, calldata)`. Unknown calls revert.
pub struct MockChain {
    calls: Mutex<HashMap<(Address, Bytes), Bytes>>,
    logs: Mutex<Vec<RawLog>>,
    /// Widest `eth_getLogs` range served; wider ranges get -32602
    max_log_span: Option<u64>,
    /// Name a servable range in range-too-large errors
    range_hint: bool,
    head: BlockRef,
    pub log_queries: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            logs: Mutex::new(Vec::new()),
            max_log_span: None,
            range_hint: false,
            head: HEAD,
            log_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_max_log_span(mut self, span: u64) -> Self {
        self.max_log_span = Some(span);
        self
    }

    pub fn with_range_hint(mut self) -> Self {
        self.range_hint = true;
        self
    }

    /// Register the ABI-encoded output of `call` against `to`
    pub fn on_call<C: SolCall>(&self, to: Address, call: C, output: Vec<u8>) -> &Self {
        self.calls
            .lock()
            .unwrap()
            .insert((to, Bytes::from(call.abi_encode())), Bytes::from(output));
        self
    }

    pub fn push_log(&self, log: RawLog) {
        self.logs.lock().unwrap().push(log);
    }

    pub fn log_queries(&self) -> usize {
        self.log_queries.load(Ordering::SeqCst)
    }
}

/// Encoding of a single return value
pub fn ret<T: SolValue>(value: T) -> Vec<u8> {
    value.abi_encode()
}

/// Encoding of a static multi-value return. Static tuples encode the same
/// with or without the outer tuple.
pub fn ret_tuple<T: SolValue>(values: T) -> Vec<u8> {
    values.abi_encode()
}

fn topics_match(filter: &LogFilter, log: &RawLog) -> bool {
    filter
        .topics
        .iter()
        .enumerate()
        .all(|(i, wanted)| match wanted {
            Some(topic) => log.topics.get(i) == Some(topic),
            None => true,
        })
}

#[async_trait]
impl ChainClient for MockChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.calls
            .lock()
            .unwrap()
            .get(&(to, data))
            .cloned()
            .ok_or_else(|| eyre::Report::new(RpcError::new(3, "execution reverted")))
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>> {
        self.log_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_log_span {
            if filter.to_block.saturating_sub(filter.from_block) + 1 > max {
                let mut message = format!("query exceeds max block range {}", max);
                if self.range_hint {
                    let to = filter.from_block + max - 1;
                    message.push_str(&format!(", this block range should work: [0x{:x}, 0x{:x}]", filter.from_block, to));
                }
                return Err(eyre::Report::new(RpcError::new(-32602, message)));
            }
        }
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.address == filter.address)
            .filter(|log| (filter.from_block..=filter.to_block).contains(&log.block_number))
            .filter(|log| topics_match(filter, log))
            .cloned()
            .collect())
    }

    async fn latest_block(&self) -> Result<BlockRef> {
        Ok(self.head)
    }
}

// ============================================
// Oracles
// ============================================

pub struct StaticSecurity(pub Option<SecurityAssessment>);

#[async_trait]
impl SecurityOracle for StaticSecurity {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn assess(&self, _token: Address, _pool: Address) -> Result<SecurityAssessment> {
        self.0.clone().ok_or_else(|| eyre!("security oracle down"))
    }
}

pub struct StaticMarket(pub Option<MarketData>);

#[async_trait]
impl MarketOracle for StaticMarket {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn market_data(&self, _token: Address) -> Result<MarketData> {
        self.0.clone().ok_or_else(|| eyre!("market oracle down"))
    }
}

pub struct StaticSource(pub Option<String>);

#[async_trait]
impl SourceCodeProvider for StaticSource {
    async fn source_code(&self, _address: Address) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

pub struct StaticPrice(pub Option<f64>);

#[async_trait]
impl ReferencePriceFeed for StaticPrice {
    async fn reference_price_usd(&self) -> Result<f64> {
        self.0.ok_or_else(|| eyre!("feed stale"))
    }
}

/// Services over `chain` with every oracle answering
pub fn services(chain: Arc<MockChain>) -> Services {
    services_with(
        chain,
        StaticSecurity(Some(SecurityAssessment {
            buy_tax: Some(1.0),
            sell_tax: Some(2.0),
            buy_gas: Some(150_000),
            sell_gas: Some(120_000),
            max_buy: None,
            max_sell: None,
            is_honeypot: Some(false),
        })),
        StaticMarket(Some(MarketData {
            price_usd: Some(0.5),
            holder_count: Some(1234),
            is_scam: Some(false),
            links: vec!["https://t.me/token".to_string()],
        })),
    )
}

pub fn services_with(
    chain: Arc<MockChain>,
    security: StaticSecurity,
    market: StaticMarket,
) -> Services {
    let chain: Arc<dyn ChainClient> = chain;
    let fetcher = LogFetcher::new(chain.clone(), BisectionLimits::default());
    Services {
        locks: LockAggregator::new(chain.clone(), fetcher.clone(), LockRegistries::default()),
        fetcher,
        security: Arc::new(security),
        market: Arc::new(market),
        source: Some(Arc::new(StaticSource(Some(
            "// https://token.io\\ncontract Token {}".to_string(),
        )))),
        price_feed: Arc::new(StaticPrice(Some(2000.0))),
        reference: WETH,
        trade_window_blocks: 7200,
        chain,
    }
}

pub fn log(address: Address, topics: Vec<B256>, data: Vec<u8>, block_number: u64, log_index: u64) -> RawLog {
    RawLog {
        address,
        topics,
        data: Bytes::from(data),
        block_number,
        log_index,
    }
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}
