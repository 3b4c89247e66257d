//! Providers Module - External Data Sources
//!
//! Chain RPC, security oracles (honeypot.is, GoPlus), market data
//! (Defined, DexScreener), Etherscan source lookup and the Chainlink
//! reference price feed.

pub mod defined;
pub mod dexscreener;
pub mod etherscan;
pub mod goplus;
pub mod honeypot_is;
pub mod price_feed;
pub mod rpc;

pub use defined::DefinedClient;
pub use dexscreener::DexScreenerClient;
pub use etherscan::EtherscanClient;
pub use goplus::GoPlusClient;
pub use honeypot_is::HoneypotIsClient;
pub use price_feed::ChainlinkPriceFeed;
pub use rpc::{RpcError, RpcProvider};

use serde_json::Value;

/// Oracles mix JSON numbers and numeric strings for the same field
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|f: &f64| f.is_finite())
}

pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_as_f64() {
        assert_eq!(value_as_f64(&json!(2.5)), Some(2.5));
        assert_eq!(value_as_f64(&json!("0.05")), Some(0.05));
        assert_eq!(value_as_f64(&json!("")), None);
        assert_eq!(value_as_f64(&json!(null)), None);
    }

    #[test]
    fn test_value_as_u64() {
        assert_eq!(value_as_u64(&json!(120000)), Some(120_000));
        assert_eq!(value_as_u64(&json!("146597")), Some(146_597));
        assert_eq!(value_as_u64(&json!(-1)), None);
    }
}
