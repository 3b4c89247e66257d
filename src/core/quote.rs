//! Exact-input trade quotes against the reference asset
//!
//! Uniswap V2: pair derived with CREATE2, constant-product output with the
//! 0.3% fee. Uniswap V3: the on-chain quoter for a single fee tier.
//! Buys spend the reference asset, sells receive it.

use alloy_primitives::aliases::{U160, U24};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::traits::{call_contract, ChainClient};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::PoolKind;
use crate::utils::constants::{
    UNISWAP_V2_FACTORY, UNISWAP_V2_FEE_NUMERATOR, UNISWAP_V2_INIT_CODE_HASH, UNISWAP_V3_FEE_TIERS,
    UNISWAP_V3_QUOTER, WETH,
};
use crate::utils::decoder::{IUniswapV2Pair, IUniswapV3Quoter};
use crate::utils::validation::parse_address;

/// Slippage is expressed in basis points of the output
const MAX_SLIPPAGE_BIPS: u32 = 10_000;

// ============================================
// Request
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Raw query parameters as received
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub trade_type: Option<String>,
    pub fee_amount: Option<String>,
    pub amount_in: Option<String>,
    pub slippage_bips: Option<String>,
}

/// A validated quote request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub token: Address,
    pub side: TradeSide,
    /// Fee tier, V3 only
    pub fee: Option<u32>,
    pub amount_in: U256,
    pub slippage_bips: u32,
}

impl QuoteRequest {
    /// Validate in a fixed order so the first problem is the one reported
    pub fn parse(kind: PoolKind, params: &QuoteParams) -> AppResult<Self> {
        let token = parse_address(params.address.as_deref().unwrap_or_default())?;

        let side = match params.trade_type.as_deref() {
            Some("buy") => TradeSide::Buy,
            Some("sell") => TradeSide::Sell,
            _ => return Err(AppError::invalid_parameter("Invalid type provided")),
        };

        let fee = match kind {
            PoolKind::UniswapV2 => None,
            PoolKind::UniswapV3 => {
                let raw = params
                    .fee_amount
                    .as_deref()
                    .ok_or_else(|| AppError::missing_parameter("feeAmount is required"))?;
                let fee = raw
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|fee| UNISWAP_V3_FEE_TIERS.contains(fee))
                    .ok_or_else(|| AppError::invalid_parameter("Invalid feeAmount provided"))?;
                Some(fee)
            }
        };

        let amount_in = params
            .amount_in
            .as_deref()
            .and_then(|raw| raw.trim().parse::<U256>().ok())
            .filter(|amount| !amount.is_zero())
            .ok_or_else(|| AppError::invalid_parameter("Invalid amountIn provided"))?;

        let slippage_bips = match params.slippage_bips.as_deref() {
            None => 0,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|bips| *bips <= MAX_SLIPPAGE_BIPS)
                .ok_or_else(|| AppError::invalid_parameter("Invalid slippageBips provided"))?,
        };

        Ok(Self {
            token,
            side,
            fee,
            amount_in,
            slippage_bips,
        })
    }
}

// ============================================
// Result
// ============================================

/// Route as the matching router expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QuotePath {
    /// V2 router: ordered token addresses
    Tokens(Vec<Address>),
    /// V3 router: packed `address ‖ uint24 ‖ address`
    Packed(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(serialize_with = "as_decimal")]
    pub amount_out: U256,
    #[serde(serialize_with = "as_decimal")]
    pub amount_out_min: U256,
    pub path: QuotePath,
}

fn as_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

// ============================================
// Pure math
// ============================================

/// Uniswap V2 `getAmountOut`. None on empty reserves, zero output or overflow.
pub fn v2_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Option<U256> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return None;
    }
    let in_with_fee = amount_in.checked_mul(U256::from(UNISWAP_V2_FEE_NUMERATOR))?;
    let numerator = in_with_fee.checked_mul(reserve_out)?;
    let denominator = reserve_in
        .checked_mul(U256::from(1000u64))?
        .checked_add(in_with_fee)?;
    Some(numerator / denominator).filter(|out| !out.is_zero())
}

/// `floor(amountOut / (1 + slippage))`
pub fn min_amount_out(amount_out: U256, slippage_bips: u32) -> U256 {
    let bps = U256::from(MAX_SLIPPAGE_BIPS);
    amount_out.saturating_mul(bps) / (bps + U256::from(slippage_bips))
}

/// Pair address for two tokens, independent of argument order
pub fn v2_pair_address(factory: Address, init_code_hash: B256, a: Address, b: Address) -> Address {
    let (token0, token1) = if a < b { (a, b) } else { (b, a) };
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_slice());
    packed[20..].copy_from_slice(token1.as_slice());
    factory.create2(keccak256(packed), init_code_hash)
}

/// `abi.encodePacked(address, uint24, address)`
pub fn v3_path(token_in: Address, fee: u32, token_out: Address) -> Bytes {
    let mut packed = Vec::with_capacity(43);
    packed.extend_from_slice(token_in.as_slice());
    packed.extend_from_slice(&fee.to_be_bytes()[1..]);
    packed.extend_from_slice(token_out.as_slice());
    packed.into()
}

// ============================================
// Engine
// ============================================

pub struct QuoteEngine {
    chain: Arc<dyn ChainClient>,
    reference: Address,
    v2_factory: Address,
    v2_init_code_hash: B256,
    v3_quoter: Address,
}

impl QuoteEngine {
    /// Mainnet Uniswap deployments, quoting against WETH
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self {
            chain,
            reference: WETH,
            v2_factory: UNISWAP_V2_FACTORY,
            v2_init_code_hash: UNISWAP_V2_INIT_CODE_HASH,
            v3_quoter: UNISWAP_V3_QUOTER,
        }
    }

    /// Validate raw parameters and quote on the given protocol
    pub async fn quote(&self, kind: PoolKind, params: &QuoteParams) -> AppResult<Quote> {
        let request = QuoteRequest::parse(kind, params)?;
        info!(
            token = %request.token,
            kind = %kind,
            side = ?request.side,
            amount_in = %request.amount_in,
            "💱 Quoting trade"
        );
        match (kind, request.fee) {
            (PoolKind::UniswapV3, Some(fee)) => self.quote_v3(&request, fee).await,
            _ => self.quote_v2(&request).await,
        }
    }

    fn route(&self, request: &QuoteRequest) -> (Address, Address) {
        match request.side {
            TradeSide::Buy => (self.reference, request.token),
            TradeSide::Sell => (request.token, self.reference),
        }
    }

    pub async fn quote_v2(&self, request: &QuoteRequest) -> AppResult<Quote> {
        let (token_in, token_out) = self.route(request);
        let pair = v2_pair_address(self.v2_factory, self.v2_init_code_hash, token_in, token_out);
        debug!(pair = %pair, "Derived V2 pair");

        let reserves = call_contract(&*self.chain, pair, IUniswapV2Pair::getReservesCall {})
            .await
            .map_err(|e| {
                warn!(pair = %pair, "⚠️ V2 reserves unavailable: {}", e);
                AppError::quote_unavailable()
            })?;
        let (reserve0, reserve1) = (U256::from(reserves.reserve0), U256::from(reserves.reserve1));
        let (reserve_in, reserve_out) = if token_in < token_out {
            (reserve0, reserve1)
        } else {
            (reserve1, reserve0)
        };

        let amount_out = v2_amount_out(request.amount_in, reserve_in, reserve_out)
            .ok_or_else(AppError::quote_unavailable)?;

        Ok(Quote {
            amount_out,
            amount_out_min: min_amount_out(amount_out, request.slippage_bips),
            path: QuotePath::Tokens(vec![token_in, token_out]),
        })
    }

    pub async fn quote_v3(&self, request: &QuoteRequest, fee: u32) -> AppResult<Quote> {
        let (token_in, token_out) = self.route(request);
        let call = IUniswapV3Quoter::quoteExactInputSingleCall {
            tokenIn: token_in,
            tokenOut: token_out,
            fee: U24::from(fee),
            amountIn: request.amount_in,
            sqrtPriceLimitX96: U160::ZERO,
        };

        let amount_out = match call_contract(&*self.chain, self.v3_quoter, call).await {
            Ok(ret) if !ret.amountOut.is_zero() => ret.amountOut,
            Ok(_) => return Err(AppError::quote_unavailable()),
            Err(e) => {
                warn!(token = %request.token, fee, "⚠️ V3 quoter call failed: {}", e);
                return Err(AppError::quote_unavailable());
            }
        };

        Ok(Quote {
            amount_out,
            amount_out_min: min_amount_out(amount_out, request.slippage_bips),
            path: QuotePath::Packed(v3_path(token_in, fee, token_out)),
        })
    }
}
