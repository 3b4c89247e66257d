//! Reference asset USD price from the on-chain Chainlink aggregator

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::debug;

use crate::core::metrics::to_decimal;
use crate::core::traits::{call_contract, ChainClient, ReferencePriceFeed};
use crate::utils::constants::CHAINLINK_ETH_USD;
use crate::utils::decoder::IChainlinkAggregator;

pub struct ChainlinkPriceFeed {
    chain: Arc<dyn ChainClient>,
    aggregator: Address,
}

impl ChainlinkPriceFeed {
    /// ETH/USD on mainnet
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self::with_aggregator(chain, CHAINLINK_ETH_USD)
    }

    pub fn with_aggregator(chain: Arc<dyn ChainClient>, aggregator: Address) -> Self {
        Self { chain, aggregator }
    }
}

#[async_trait]
impl ReferencePriceFeed for ChainlinkPriceFeed {
    async fn reference_price_usd(&self) -> Result<f64> {
        let chain = &*self.chain;
        let (decimals, round) = tokio::try_join!(
            call_contract(chain, self.aggregator, IChainlinkAggregator::decimalsCall {}),
            call_contract(chain, self.aggregator, IChainlinkAggregator::latestRoundDataCall {}),
        )?;

        if round.answer.is_negative() || round.answer.is_zero() {
            return Err(eyre!("Chainlink answer is not positive: {}", round.answer));
        }
        let price = to_decimal(round.answer.into_raw(), decimals._0);
        debug!(price, "Chainlink reference price");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{BlockRef, LogFilter, RawLog};
    use alloy_primitives::{Bytes, I256, U256};
    use alloy_sol_types::{SolCall, SolValue};

    struct Aggregator {
        answer: I256,
    }

    #[async_trait]
    impl ChainClient for Aggregator {
        async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
            let selector: [u8; 4] = data[..4].try_into()?;
            if selector == IChainlinkAggregator::decimalsCall::SELECTOR {
                Ok(U256::from(8u8).abi_encode().into())
            } else {
                Ok((U256::from(1u8), self.answer, U256::ZERO, U256::ZERO, U256::from(1u8))
                    .abi_encode_params()
                    .into())
            }
        }

        async fn get_logs(&self, _filter: &LogFilter) -> Result<Vec<RawLog>> {
            Ok(Vec::new())
        }

        async fn latest_block(&self) -> Result<BlockRef> {
            Ok(BlockRef::default())
        }
    }

    #[tokio::test]
    async fn test_scales_by_feed_decimals() {
        let feed = ChainlinkPriceFeed::new(Arc::new(Aggregator {
            answer: I256::try_from(2_500_12000000i64).unwrap(),
        }));
        assert_eq!(feed.reference_price_usd().await.unwrap(), 2500.12);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_answer() {
        let feed = ChainlinkPriceFeed::new(Arc::new(Aggregator {
            answer: I256::try_from(-1i64).unwrap(),
        }));
        assert!(feed.reference_price_usd().await.is_err());
    }
}
