//! Derived report figures. Pure functions, no I/O.

use alloy_primitives::{Address, U256};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::models::types::{AssetSide, PoolKind, ReserveSnapshot, SwapEvent, TradeCounts};
use crate::utils::constants::{BOILERPLATE_LINK_FRAGMENTS, BURN_ADDRESS, WETH_DECIMALS};

lazy_static! {
    static ref URL: Regex = Regex::new(r"https?://[^\s]+").expect("static regex");
}

/// Basis points in one whole
const BPS: u64 = 10_000;

/// Scale an integer amount down by `decimals`
pub fn to_decimal(amount: U256, decimals: u8) -> f64 {
    let digits = amount.to_string();
    let scale = decimals as usize;
    let text = if scale == 0 {
        digits
    } else if digits.len() > scale {
        let (whole, frac) = digits.split_at(digits.len() - scale);
        format!("{}.{}", whole, frac)
    } else {
        format!("0.{}{}", "0".repeat(scale - digits.len()), digits)
    };
    text.parse().unwrap_or_default()
}

/// `integerSupply / 10^decimals`
pub fn decimal_supply(total_supply: Option<U256>, decimals: u8) -> Option<f64> {
    total_supply.map(|supply| to_decimal(supply, decimals))
}

/// `decimalSupply * priceUsd` when both are known
pub fn market_cap(decimal_supply: Option<f64>, price_usd: Option<f64>) -> Option<f64> {
    Some(decimal_supply? * price_usd?)
}

/// Reference-asset reserve, in whole units
pub fn pooled_reference(reserves: &ReserveSnapshot, reference_side: AssetSide) -> f64 {
    to_decimal(reserves.reserve(reference_side), WETH_DECIMALS)
}

/// Round half away from zero to two places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `current / initial - 1`, two places. None without a usable initial value.
pub fn pool_growth(current: f64, initial: Option<f64>) -> Option<f64> {
    let initial = initial.filter(|v| v.is_finite() && *v > 0.0)?;
    Some(round2(current / initial - 1.0))
}

/// Both sides of the pool valued at the reference price
pub fn current_liquidity(pooled_reference: f64, reference_price_usd: Option<f64>) -> Option<f64> {
    reference_price_usd.map(|price| pooled_reference * price * 2.0)
}

/// Count buys and sells of the non-reference token.
///
/// A swap where the pool paid out the token is a buy; one where it paid out
/// the reference asset is a sell. `SwapEvent` deltas are already normalised
/// to the pool's point of view by the protocol decoder.
pub fn classify_trades(swaps: &[SwapEvent], reference_side: AssetSide) -> TradeCounts {
    let token_side = reference_side.other();
    swaps.iter().fold(TradeCounts::default(), |mut counts, swap| {
        if swap.pays_out(token_side) {
            counts.buys += 1;
        }
        if swap.pays_out(reference_side) {
            counts.sells += 1;
        }
        counts
    })
}

/// Ownership given up to the zero or burn address
pub fn is_renounced(owner: Option<Address>) -> bool {
    matches!(owner, Some(o) if o == Address::ZERO || o == BURN_ADDRESS)
}

pub fn is_verified(source_code: Option<&str>) -> bool {
    source_code.is_some_and(|code| !code.trim().is_empty())
}

/// Simulated tax plus the pool's own fee on fee-tiered pools.
///
/// Taxes are percentages; V3 fees are hundredths of a bip, so `fee / 10_000`
/// is the fee in percent (3000 -> 0.3). On fee-tiered pools an unknown
/// simulated tax counts as zero, so the fee is still reported.
pub fn combined_tax(kind: PoolKind, simulated: Option<f64>, pool_fee: Option<u32>) -> Option<f64> {
    match kind {
        PoolKind::UniswapV2 => simulated,
        PoolKind::UniswapV3 => {
            let fee = f64::from(pool_fee.unwrap_or_default()) / BPS as f64;
            Some(simulated.unwrap_or_default() + fee)
        }
    }
}

/// Truncated basis points of supply, as a fraction in [0, 1]
pub fn percent_of_supply(amount: U256, total_supply: U256) -> f64 {
    if total_supply.is_zero() {
        return 0.0;
    }
    let bps = amount.saturating_mul(U256::from(BPS)) / total_supply;
    let bps = bps.min(U256::from(BPS)).to::<u64>();
    bps as f64 / BPS as f64
}

/// Project links found in verified source, minus library/tooling boilerplate
pub fn extract_source_links(source_code: &str) -> Vec<String> {
    let flattened = source_code.replace("\\n", " ");
    URL.find_iter(&flattened)
        .map(|m| m.as_str())
        .filter(|link| !BOILERPLATE_LINK_FRAGMENTS.iter().any(|frag| link.contains(frag)))
        .map(str::to_string)
        .collect()
}

/// De-duplicated union, first occurrence wins
pub fn merge_links(source_links: Vec<String>, market_links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    source_links
        .into_iter()
        .chain(market_links)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, I256};

    fn swap(d0: i64, d1: i64) -> SwapEvent {
        SwapEvent {
            block_number: 1,
            log_index: 0,
            delta0: I256::try_from(d0).unwrap(),
            delta1: I256::try_from(d1).unwrap(),
        }
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(U256::from(1_500_000_000_000_000_000u128), 18), 1.5);
        assert_eq!(to_decimal(U256::from(5u64), 3), 0.005);
        assert_eq!(to_decimal(U256::from(42u64), 0), 42.0);
        assert_eq!(to_decimal(U256::ZERO, 18), 0.0);
    }

    #[test]
    fn test_market_cap_needs_both() {
        assert_eq!(market_cap(Some(1000.0), Some(0.5)), Some(500.0));
        assert_eq!(market_cap(None, Some(0.5)), None);
        assert_eq!(market_cap(Some(1000.0), None), None);
    }

    #[test]
    fn test_pool_growth() {
        assert_eq!(pool_growth(15.0, Some(10.0)), Some(0.5));
        assert_eq!(pool_growth(10.0, Some(15.0)), Some(-0.33));
        assert_eq!(pool_growth(15.0, None), None);
        assert_eq!(pool_growth(15.0, Some(0.0)), None);
    }

    #[test]
    fn test_current_liquidity_doubles() {
        assert_eq!(current_liquidity(10.0, Some(2000.0)), Some(40_000.0));
        assert_eq!(current_liquidity(10.0, None), None);
    }

    #[test]
    fn test_percent_of_supply_truncates() {
        assert_eq!(percent_of_supply(U256::from(250_000u64), U256::from(1_000_000u64)), 0.25);
        // 1/3 -> 3333 bps, not 0.33333...
        assert_eq!(percent_of_supply(U256::from(1u64), U256::from(3u64)), 0.3333);
        assert_eq!(percent_of_supply(U256::from(1u64), U256::ZERO), 0.0);
    }

    #[test]
    fn test_classify_reference_token0() {
        // Pool pays out token1 (the token): buy. Pays out token0 (WETH): sell.
        let swaps = vec![swap(10, -5), swap(10, -5), swap(-3, 8)];
        let counts = classify_trades(&swaps, AssetSide::Token0);
        assert_eq!(counts, TradeCounts { buys: 2, sells: 1 });
    }

    #[test]
    fn test_classify_reference_token1() {
        let swaps = vec![swap(10, -5), swap(-3, 8)];
        let counts = classify_trades(&swaps, AssetSide::Token1);
        assert_eq!(counts, TradeCounts { buys: 1, sells: 1 });
    }

    #[test]
    fn test_renounced() {
        assert!(is_renounced(Some(Address::ZERO)));
        assert!(is_renounced(Some(BURN_ADDRESS)));
        assert!(!is_renounced(Some(address!("1111111111111111111111111111111111111111"))));
        assert!(!is_renounced(None));
    }

    #[test]
    fn test_verified() {
        assert!(is_verified(Some("contract A {}")));
        assert!(!is_verified(Some("  ")));
        assert!(!is_verified(None));
    }

    #[test]
    fn test_combined_tax() {
        assert_eq!(combined_tax(PoolKind::UniswapV2, Some(5.0), None), Some(5.0));
        assert_eq!(combined_tax(PoolKind::UniswapV3, Some(5.0), Some(3000)), Some(5.3));
        assert_eq!(combined_tax(PoolKind::UniswapV3, None, Some(3000)), Some(0.3));
        assert_eq!(combined_tax(PoolKind::UniswapV2, None, None), None);
    }

    #[test]
    fn test_extract_source_links() {
        let code = "// Website: https://example.io\\n// Docs https://docs.openzeppelin.com/contracts\\n// tg: https://t.me/example";
        assert_eq!(
            extract_source_links(code),
            vec!["https://example.io".to_string(), "https://t.me/example".to_string()]
        );
    }

    #[test]
    fn test_merge_links_dedupes_in_order() {
        let merged = merge_links(
            vec!["https://a.io".into(), "https://b.io".into()],
            vec!["https://b.io".into(), "https://c.io".into()],
        );
        assert_eq!(merged, vec!["https://a.io", "https://b.io", "https://c.io"]);
    }
}
