//! Collaborator seams
//!
//! Everything the report pipeline talks to sits behind one of these traits so
//! the pipeline can run against live providers or in-memory fakes.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use eyre::{eyre, Result};

use crate::models::types::{BlockRef, LogFilter, MarketData, RawLog, SecurityAssessment};

/// Read-only chain access
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// `eth_getLogs` over an inclusive range. May fail with a range-too-large
    /// `RpcError` that callers are expected to classify.
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>>;

    /// Current head number and timestamp
    async fn latest_block(&self) -> Result<BlockRef>;
}

/// Simulated trade outcome for a token
#[async_trait]
pub trait SecurityOracle: Send + Sync {
    fn name(&self) -> &'static str;

    async fn assess(&self, token: Address, pool: Address) -> Result<SecurityAssessment>;
}

/// Price, holders, scam flag and project links
#[async_trait]
pub trait MarketOracle: Send + Sync {
    fn name(&self) -> &'static str;

    async fn market_data(&self, token: Address) -> Result<MarketData>;
}

/// Verified contract source. `Ok(None)` means the contract is not verified.
#[async_trait]
pub trait SourceCodeProvider: Send + Sync {
    async fn source_code(&self, address: Address) -> Result<Option<String>>;
}

/// USD price of the reference asset
#[async_trait]
pub trait ReferencePriceFeed: Send + Sync {
    async fn reference_price_usd(&self) -> Result<f64>;
}

/// ABI-encode `call`, run it against `to`, decode the returns
pub async fn call_contract<C>(client: &dyn ChainClient, to: Address, call: C) -> Result<C::Return>
where
    C: SolCall + Send,
{
    let output = client.call(to, Bytes::from(call.abi_encode())).await?;
    C::abi_decode_returns(&output, false)
        .map_err(|e| eyre!("Failed to decode {} from {}: {}", C::SIGNATURE, to, e))
}
