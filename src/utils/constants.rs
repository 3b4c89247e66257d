//! Constants Module - Single Source of Truth
//!
//! Contract addresses, event topics, service endpoints and enrichment
//! defaults used across the crate. No hardcoded values in other modules.

use alloy_primitives::{address, b256, Address, B256};

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "pairscope";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("pairscope/", env!("CARGO_PKG_VERSION"));

/// Default timeout for RPC and oracle requests (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Ethereum mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;

// ============================================
// TOKENS & SPECIAL ADDRESSES
// ============================================

/// Wrapped ether, the reference asset every reported pool must contain
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// Canonical burn address for pool shares
pub const BURN_ADDRESS: Address = address!("000000000000000000000000000000000000dEaD");

/// Reference asset decimals
pub const WETH_DECIMALS: u8 = 18;

// ============================================
// LOCK REGISTRIES
// ============================================

/// Unicrypt V2 liquidity locker
pub const UNICRYPT_LOCKER: Address = address!("663A5C229c09b049E36dCc11a9B0d4a8Eb9db214");

/// Team Finance lock registry
pub const TEAM_FINANCE_LOCKER: Address = address!("E2fE530C047f2d85298b07D9333C05737f1435fB");

// ============================================
// PRICE FEEDS
// ============================================

/// Chainlink ETH/USD aggregator
pub const CHAINLINK_ETH_USD: Address = address!("5f4eC3Df9cbd43714FE2740f5E3616155c5b8419");

// ============================================
// UNISWAP
// ============================================

/// Uniswap V2 factory
pub const UNISWAP_V2_FACTORY: Address = address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");

/// Uniswap V2 pair init code hash (CREATE2)
pub const UNISWAP_V2_INIT_CODE_HASH: B256 =
    b256!("96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f");

/// Uniswap V2 swap fee, numerator over 1000
pub const UNISWAP_V2_FEE_NUMERATOR: u64 = 997;

/// Uniswap V3 Quoter (v1)
pub const UNISWAP_V3_QUOTER: Address = address!("b27308f9F90D607463bb33eA1BeBb41C27CE5AB6");

/// Valid Uniswap V3 fee tiers, in hundredths of a bip
pub const UNISWAP_V3_FEE_TIERS: [u32; 4] = [100, 500, 3000, 10000];

// ============================================
// EVENT TOPICS
// ============================================

/// keccak("Sync(uint112,uint112)")
pub const SYNC_TOPIC: B256 =
    b256!("1c411e9a96e071241c2f21f7726b17ae89e3cab4c78be50e062b03a9fffbbad1");

// ============================================
// BLOCK WINDOWS
// ============================================

/// Roughly 24h of mainnet blocks at 12s
pub const TRADE_WINDOW_BLOCKS: u64 = 7200;

/// Smallest range the log fetcher will still split
pub const DEFAULT_LOG_MIN_SPAN: u64 = 1;

/// Deepest the log fetcher will recurse
pub const DEFAULT_LOG_MAX_DEPTH: u32 = 24;

/// JSON-RPC error code for a log query whose range is too large
pub const RPC_RANGE_TOO_LARGE: i64 = -32602;

/// JSON-RPC error code for a rate limited request
pub const RPC_RATE_LIMITED: i64 = -32005;

// ============================================
// ORACLE QUOTAS
// ============================================

/// Admissions allowed inside the sliding window
pub const DEFAULT_ORACLE_RATE_THRESHOLD: usize = 30;

/// Admissions expiring per second (window = 1000 / rate ms)
pub const DEFAULT_ORACLE_DECREMENT_RATE: f64 = 0.5;

// ============================================
// SERVICE ENDPOINTS
// ============================================

pub const HONEYPOT_IS_BASE_URL: &str = "https://api.honeypot.is";
pub const GOPLUS_BASE_URL: &str = "https://api.gopluslabs.io";
pub const DEFINED_BASE_URL: &str = "https://api.defined.fi";
pub const DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";
pub const ETHERSCAN_BASE_URL: &str = "https://api.etherscan.io";

/// Build Alchemy mainnet URL from an API key
pub fn build_alchemy_url(api_key: &str) -> String {
    format!("https://eth-mainnet.g.alchemy.com/v2/{}", api_key)
}

// ============================================
// ENRICHMENT DEFAULTS
// ============================================

pub const DEFAULT_TOKEN_NAME: &str = "<Unnamed Token>";
pub const DEFAULT_TOKEN_SYMBOL: &str = "ERC20";
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Hosts that show up in boilerplate contract comments rather than project links
pub const BOILERPLATE_LINK_FRAGMENTS: [&str; 13] = [
    "github.com/ethereum",
    "github.com/OpenZeppelin",
    "readthedocs.io",
    "consensys.net",
    "ethereum.org",
    "openzeppelin.com",
    "forum.zeppelin.solutions",
    "github.com/oraclize",
    "docs.ethers.io",
    "ethereum.github.io",
    "eth.wiki",
    "docs.metamask.io",
    "hardhat.org",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alchemy_url() {
        assert_eq!(
            build_alchemy_url("abc"),
            "https://eth-mainnet.g.alchemy.com/v2/abc"
        );
    }

    #[test]
    fn test_sync_topic_matches_signature() {
        let hash = alloy_primitives::keccak256("Sync(uint112,uint112)");
        assert_eq!(hash, SYNC_TOPIC);
    }

    #[test]
    fn test_fee_tiers_sorted() {
        assert!(UNISWAP_V3_FEE_TIERS.windows(2).all(|w| w[0] < w[1]));
    }
}
