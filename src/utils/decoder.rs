//! Contract ABIs and event decoding
//! Turns raw logs into pool-side swap deltas, reserve snapshots and lock ids

use crate::models::types::{PoolKind, RawLog, ReserveSnapshot, SwapEvent};
use alloy_primitives::{Address, B256, I256, U256};
use alloy_sol_types::{sol, SolEvent};

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function owner() external view returns (address);
        function balanceOf(address account) external view returns (uint256);
    }

    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);

        event Sync(uint112 reserve0, uint112 reserve1);
        event Swap(
            address indexed sender,
            uint256 amount0In,
            uint256 amount1In,
            uint256 amount0Out,
            uint256 amount1Out,
            address indexed to
        );
    }

    interface IUniswapV3Pool {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function fee() external view returns (uint24);

        event Swap(
            address indexed sender,
            address indexed recipient,
            int256 amount0,
            int256 amount1,
            uint160 sqrtPriceX96,
            uint128 liquidity,
            int24 tick
        );
    }

    interface IUniswapV3Quoter {
        function quoteExactInputSingle(
            address tokenIn,
            address tokenOut,
            uint24 fee,
            uint256 amountIn,
            uint160 sqrtPriceLimitX96
        ) external returns (uint256 amountOut);
    }

    interface IUnicryptLocker {
        function getNumLocksForToken(address lpToken) external view returns (uint256);
        function tokenLocks(address lpToken, uint256 index) external view returns (
            uint256 lockDate,
            uint256 amount,
            uint256 initialAmount,
            uint256 unlockDate,
            uint256 lockID,
            address owner
        );
    }

    interface ITeamFinanceLocker {
        event Deposit(
            uint256 id,
            address indexed tokenAddress,
            address indexed withdrawalAddress,
            uint256 amount,
            uint256 unlockTime
        );

        function lockedToken(uint256 id) external view returns (
            address tokenAddress,
            address withdrawalAddress,
            uint256 tokenAmount,
            uint256 unlockTime,
            bool withdrawn
        );
    }

    interface IChainlinkAggregator {
        function decimals() external view returns (uint8);
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}

/// Topic0 of the swap event for a protocol
pub fn swap_topic(kind: PoolKind) -> B256 {
    match kind {
        PoolKind::UniswapV2 => IUniswapV2Pair::Swap::SIGNATURE_HASH,
        PoolKind::UniswapV3 => IUniswapV3Pool::Swap::SIGNATURE_HASH,
    }
}

/// Left-pad an address into an indexed topic
pub fn address_topic(address: Address) -> B256 {
    address.into_word()
}

/// Decode a swap log into pool-side deltas.
///
/// V2 logs carry unsigned in/out legs; the delta is `in - out`.
/// V3 logs already carry signed pool-side deltas.
pub fn decode_swap(kind: PoolKind, log: &RawLog) -> Option<SwapEvent> {
    if log.topics.first() != Some(&swap_topic(kind)) {
        return None;
    }
    let (delta0, delta1) = match kind {
        PoolKind::UniswapV2 => {
            let swap = IUniswapV2Pair::Swap::decode_raw_log(log.topics.iter().copied(), &log.data, false).ok()?;
            (
                net_delta(swap.amount0In, swap.amount0Out)?,
                net_delta(swap.amount1In, swap.amount1Out)?,
            )
        }
        PoolKind::UniswapV3 => {
            let swap = IUniswapV3Pool::Swap::decode_raw_log(log.topics.iter().copied(), &log.data, false).ok()?;
            (swap.amount0, swap.amount1)
        }
    };
    Some(SwapEvent {
        block_number: log.block_number,
        log_index: log.log_index,
        delta0,
        delta1,
    })
}

fn net_delta(amount_in: U256, amount_out: U256) -> Option<I256> {
    let amount_in = I256::try_from(amount_in).ok()?;
    let amount_out = I256::try_from(amount_out).ok()?;
    amount_in.checked_sub(amount_out)
}

/// Decode a `Sync` log into a reserve snapshot at the log's block
pub fn decode_sync(log: &RawLog) -> Option<ReserveSnapshot> {
    if log.topics.first() != Some(&IUniswapV2Pair::Sync::SIGNATURE_HASH) {
        return None;
    }
    let sync = IUniswapV2Pair::Sync::decode_raw_log(log.topics.iter().copied(), &log.data, false).ok()?;
    Some(ReserveSnapshot {
        reserve0: U256::from(sync.reserve0),
        reserve1: U256::from(sync.reserve1),
        block: log.block_number,
    })
}

/// Lock id referenced by a Team Finance deposit log
pub fn decode_deposit_id(log: &RawLog) -> Option<U256> {
    if log.topics.first() != Some(&ITeamFinanceLocker::Deposit::SIGNATURE_HASH) {
        return None;
    }
    ITeamFinanceLocker::Deposit::decode_raw_log(log.topics.iter().copied(), &log.data, false)
        .ok()
        .map(|deposit| deposit.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes};
    use alloy_sol_types::SolValue;

    const POOL: Address = address!("2222222222222222222222222222222222222222");

    fn raw(topics: Vec<B256>, data: Vec<u8>) -> RawLog {
        RawLog {
            address: POOL,
            topics,
            data: Bytes::from(data),
            block_number: 42,
            log_index: 3,
        }
    }

    #[test]
    fn test_decode_v2_swap_deltas() {
        let sender = address!("3333333333333333333333333333333333333333");
        let data = (U256::from(1000u64), U256::ZERO, U256::ZERO, U256::from(250u64)).abi_encode_params();
        let log = raw(
            vec![swap_topic(PoolKind::UniswapV2), address_topic(sender), address_topic(sender)],
            data,
        );
        let swap = decode_swap(PoolKind::UniswapV2, &log).unwrap();
        assert_eq!(swap.delta0, I256::try_from(1000i64).unwrap());
        assert_eq!(swap.delta1, I256::try_from(-250i64).unwrap());
        assert_eq!(swap.block_number, 42);
    }

    #[test]
    fn test_decode_v3_swap_keeps_signs() {
        let sender = address!("3333333333333333333333333333333333333333");
        let amount0 = I256::try_from(-77i64).unwrap();
        let amount1 = I256::try_from(5i64).unwrap();
        let mut data = Vec::new();
        data.extend_from_slice(&amount0.to_be_bytes::<32>());
        data.extend_from_slice(&amount1.to_be_bytes::<32>());
        data.extend_from_slice(&[0u8; 32 * 3]);
        let log = raw(
            vec![swap_topic(PoolKind::UniswapV3), address_topic(sender), address_topic(sender)],
            data,
        );
        let swap = decode_swap(PoolKind::UniswapV3, &log).unwrap();
        assert_eq!(swap.delta0, amount0);
        assert_eq!(swap.delta1, amount1);
    }

    #[test]
    fn test_decode_sync() {
        let data = (U256::from(10u64), U256::from(20u64)).abi_encode_params();
        let log = raw(vec![crate::utils::constants::SYNC_TOPIC], data);
        let snap = decode_sync(&log).unwrap();
        assert_eq!(snap.reserve0, U256::from(10u64));
        assert_eq!(snap.reserve1, U256::from(20u64));
        assert_eq!(snap.block, 42);
    }

    #[test]
    fn test_wrong_topic_rejected() {
        let data = (U256::from(10u64), U256::from(20u64)).abi_encode_params();
        let log = raw(vec![B256::ZERO], data);
        assert!(decode_sync(&log).is_none());
    }
}
