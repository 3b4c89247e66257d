//! Report aggregation
//!
//! 1. Validate the pool address (no I/O on malformed input)
//! 2. Mandatory pool reads: assets, reserves, chain head. Failure aborts.
//! 3. Resolve which side is the reference asset
//! 4. Fan out every enrichment source as its own task, join once
//! 5. Merge through `metrics`
//!
//! Enrichment failures never abort a report. Each one is logged, replaced
//! by its default and recorded in the report's provenance map.

use alloy_primitives::{Address, U256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use super::locks::{LockAggregator, LockRegistries};
use super::log_fetcher::{BisectionLimits, LogBatch, LogFetcher};
use super::metrics;
use super::traits::{
    call_contract, ChainClient, MarketOracle, ReferencePriceFeed, SecurityOracle,
    SourceCodeProvider,
};
use crate::models::config::{AppConfig, SecurityOracleKind};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    BlockRef, LockRecord, LogFilter, MarketData, PoolIdentity, PoolKind, Provenance,
    ReportFlags, ReserveSnapshot, SecurityAssessment, Sourced, SwapEvent, TokenMetadata,
    TokenReport,
};
use crate::providers::{
    ChainlinkPriceFeed, DefinedClient, DexScreenerClient, EtherscanClient, GoPlusClient,
    HoneypotIsClient, RpcProvider,
};
use crate::utils::constants::{
    DEFAULT_TOKEN_DECIMALS, DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL, SYNC_TOPIC, WETH,
};
use crate::utils::decoder::{decode_sync, IUniswapV2Pair, IUniswapV3Pool, IERC20};
use crate::utils::rate_limiter::RateLimiter;
use crate::utils::validation::parse_address;

/// Client-facing message for aborts after the mandatory reads
const ASSEMBLY_FAILED: &str = "Errored while retrieving pair details";

// ============================================
// Collaborators
// ============================================

/// Everything a report needs, shared by all requests
pub struct Services {
    pub chain: Arc<dyn ChainClient>,
    pub fetcher: LogFetcher,
    pub locks: LockAggregator,
    pub security: Arc<dyn SecurityOracle>,
    pub market: Arc<dyn MarketOracle>,
    /// None without a block explorer API key
    pub source: Option<Arc<dyn SourceCodeProvider>>,
    pub price_feed: Arc<dyn ReferencePriceFeed>,
    /// Reference asset every pool must contain
    pub reference: Address,
    /// Blocks counted back from the head for trade counts
    pub trade_window_blocks: u64,
}

impl Services {
    /// Live providers wired from configuration. One rate limiter is shared
    /// by every quota-constrained oracle.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let timeout = config.http_timeout;
        let chain: Arc<dyn ChainClient> =
            Arc::new(RpcProvider::new(config.rpc_url.as_str(), timeout)?);
        let limiter = Arc::new(RateLimiter::new(
            config.oracle_quota.decrement_rate,
            config.oracle_quota.threshold,
        )?);

        let security: Arc<dyn SecurityOracle> = match config.security_oracle {
            SecurityOracleKind::HoneypotIs => {
                Arc::new(
                    HoneypotIsClient::new()
                        .with_timeout(timeout)
                        .with_limiter(limiter.clone()),
                )
            }
            SecurityOracleKind::GoPlus => {
                Arc::new(GoPlusClient::new(limiter.clone()).with_timeout(timeout))
            }
        };

        let market: Arc<dyn MarketOracle> = match &config.defined_api_key {
            Some(key) => Arc::new(
                DefinedClient::new(key.as_str())
                    .with_timeout(timeout)
                    .with_limiter(limiter.clone()),
            ),
            None => Arc::new(
                DexScreenerClient::new()
                    .with_timeout(timeout)
                    .with_limiter(limiter.clone()),
            ),
        };

        let source = config.etherscan_api_key.as_ref().map(|key| {
            let client = EtherscanClient::new(key.as_str())
                .with_timeout(timeout)
                .with_limiter(limiter.clone());
            Arc::new(client) as Arc<dyn SourceCodeProvider>
        });

        let fetcher = LogFetcher::new(chain.clone(), BisectionLimits::from(&config.logs));
        let registries = LockRegistries {
            team_finance_from_block: config.logs.team_finance_from_block,
            ..Default::default()
        };

        info!(
            rpc = %config.masked_rpc_url(),
            security = security.name(),
            market = market.name(),
            explorer = source.is_some(),
            "🔧 Services configured"
        );

        Ok(Self {
            locks: LockAggregator::new(chain.clone(), fetcher.clone(), registries),
            price_feed: Arc::new(ChainlinkPriceFeed::new(chain.clone())),
            chain,
            fetcher,
            security,
            market,
            source,
            reference: WETH,
            trade_window_blocks: config.logs.trade_window_blocks,
        })
    }
}

// ============================================
// Mandatory reads
// ============================================

/// Pool state every report is built on
#[derive(Debug, Clone)]
struct PoolState {
    identity: PoolIdentity,
    /// V3 pools only carry the reference-side balance; the token side is zero
    reserves: ReserveSnapshot,
    head: BlockRef,
}

impl Services {
    async fn read_pool(&self, pool: Address, kind: PoolKind) -> AppResult<PoolState> {
        let chain = &*self.chain;
        let read = match kind {
            PoolKind::UniswapV2 => tokio::try_join!(
                call_contract(chain, pool, IUniswapV2Pair::token0Call {}),
                call_contract(chain, pool, IUniswapV2Pair::token1Call {}),
                call_contract(chain, pool, IUniswapV2Pair::getReservesCall {}),
                chain.latest_block(),
            )
            .map(|(t0, t1, reserves, head)| {
                let snapshot = ReserveSnapshot {
                    reserve0: U256::from(reserves.reserve0),
                    reserve1: U256::from(reserves.reserve1),
                    block: head.number,
                };
                (t0._0, t1._0, None, snapshot, head)
            }),
            PoolKind::UniswapV3 => tokio::try_join!(
                call_contract(chain, pool, IUniswapV3Pool::token0Call {}),
                call_contract(chain, pool, IUniswapV3Pool::token1Call {}),
                call_contract(chain, pool, IUniswapV3Pool::feeCall {}),
                call_contract(chain, self.reference, IERC20::balanceOfCall { account: pool }),
                chain.latest_block(),
            )
            .map(|(t0, t1, fee, balance, head)| {
                let (reserve0, reserve1) = if t0._0 == self.reference {
                    (balance._0, U256::ZERO)
                } else {
                    (U256::ZERO, balance._0)
                };
                let snapshot = ReserveSnapshot {
                    reserve0,
                    reserve1,
                    block: head.number,
                };
                (t0._0, t1._0, Some(fee._0.to::<u32>()), snapshot, head)
            }),
        };

        let (token0, token1, fee, reserves, head) = read.map_err(|e| {
            warn!(pool = %pool, kind = %kind, "❌ Mandatory pool read failed: {}", e);
            AppError::pool_not_found(kind.protocol_name())
        })?;

        let identity = PoolIdentity::resolve(pool, kind, token0, token1, self.reference, fee)
            .ok_or_else(AppError::no_reference_asset)?;

        Ok(PoolState {
            identity,
            reserves,
            head,
        })
    }
}

// ============================================
// Enrichment
// ============================================

/// Log the upstream error, keep only a generic reason
fn soft<T, E: fmt::Display>(
    group: &'static str,
    result: Result<T, E>,
    fallback: T,
) -> Sourced<T> {
    if let Err(e) = &result {
        warn!(group, "⚠️ Enrichment source failed, using default: {}", e);
    }
    Sourced::from_result(result, fallback, format!("{} unavailable", group))
}

impl Services {
    /// Each ERC-20 read falls back on its own
    async fn token_metadata(&self, token: Address) -> (Sourced<TokenMetadata>, Sourced<Option<Address>>) {
        let chain = &*self.chain;
        let (name, symbol, decimals, supply, owner) = tokio::join!(
            call_contract(chain, token, IERC20::nameCall {}),
            call_contract(chain, token, IERC20::symbolCall {}),
            call_contract(chain, token, IERC20::decimalsCall {}),
            call_contract(chain, token, IERC20::totalSupplyCall {}),
            call_contract(chain, token, IERC20::ownerCall {}),
        );

        let mut failed = Vec::new();
        let name = name.map(|r| r._0).unwrap_or_else(|e| {
            debug!(token = %token, "name() failed: {}", e);
            failed.push("name");
            DEFAULT_TOKEN_NAME.to_string()
        });
        let symbol = symbol.map(|r| r._0).unwrap_or_else(|e| {
            debug!(token = %token, "symbol() failed: {}", e);
            failed.push("symbol");
            DEFAULT_TOKEN_SYMBOL.to_string()
        });
        let decimals = match decimals.map(|r| u8::try_from(r._0)) {
            Ok(Ok(d)) => d,
            _ => {
                failed.push("decimals");
                DEFAULT_TOKEN_DECIMALS
            }
        };
        let total_supply = supply
            .map(|r| r._0)
            .map_err(|e| {
                debug!(token = %token, "totalSupply() failed: {}", e);
                failed.push("totalSupply");
            })
            .ok();

        let metadata = TokenMetadata {
            name,
            symbol,
            decimals,
            total_supply,
            owner: None,
        };
        let metadata = if failed.is_empty() {
            Sourced::Fresh(metadata)
        } else {
            warn!(token = %token, failed = ?failed, "⚠️ Token metadata incomplete, using defaults");
            Sourced::degraded(metadata, format!("{} unavailable", failed.join(", ")))
        };

        // Tokens without Ownable revert here; that is not an error worth a warning
        let owner = match owner {
            Ok(r) => Sourced::Fresh(Some(r._0)),
            Err(e) => {
                debug!(token = %token, "owner() failed: {}", e);
                Sourced::degraded(None, "owner unavailable")
            }
        };
        (metadata, owner)
    }

    async fn security(&self, token: Address, pool: Address) -> Sourced<SecurityAssessment> {
        soft("security oracle", self.security.assess(token, pool).await, SecurityAssessment::default())
    }

    async fn market(&self, token: Address) -> Sourced<MarketData> {
        soft("market oracle", self.market.market_data(token).await, MarketData::default())
    }

    async fn source_code(&self, token: Address) -> Sourced<Option<String>> {
        match &self.source {
            Some(source) => soft("block explorer", source.source_code(token).await, None),
            None => Sourced::degraded(None, "block explorer not configured"),
        }
    }

    async fn reference_price(&self) -> Sourced<Option<f64>> {
        soft("reference price feed", self.price_feed.reference_price_usd().await.map(Some), None)
    }

    async fn locks(&self, state: &PoolState) -> Sourced<Vec<LockRecord>> {
        match state.identity.kind {
            PoolKind::UniswapV2 => self.locks.list_locks_at(state.identity.pool, state.head).await,
            PoolKind::UniswapV3 => Sourced::degraded(Vec::new(), "not applicable"),
        }
    }

    /// Reserves at the pool's first `Sync`
    async fn initial_reserves(&self, state: &PoolState) -> Sourced<Option<ReserveSnapshot>> {
        if state.identity.kind != PoolKind::UniswapV2 {
            return Sourced::degraded(None, "not applicable");
        }
        let filter = LogFilter::new(state.identity.pool, SYNC_TOPIC, 0, state.head.number);
        soft(
            "initial liquidity",
            self.fetcher
                .fetch_earliest(&filter)
                .await
                .map(|log| log.as_ref().and_then(decode_sync)),
            None,
        )
    }

    async fn recent_swaps(&self, state: &PoolState) -> Sourced<LogBatch<SwapEvent>> {
        let to = state.head.number;
        let from = to.saturating_sub(self.trade_window_blocks);
        let batch = self
            .fetcher
            .fetch_swaps(state.identity.pool, state.identity.kind, from, to)
            .await;
        if batch.is_complete() {
            Sourced::Fresh(batch)
        } else {
            Sourced::degraded(batch, "swap history incomplete")
        }
    }
}

// ============================================
// Aggregator
// ============================================

/// Builds one report per request; nothing is shared between requests
/// except the services themselves
#[derive(Clone)]
pub struct ReportAggregator {
    services: Arc<Services>,
}

fn joined<T>(result: Result<T, JoinError>) -> AppResult<T> {
    result.map_err(|e| {
        error!("❌ Enrichment task aborted: {}", e);
        AppError::internal(ASSEMBLY_FAILED)
    })
}

impl ReportAggregator {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub async fn build_report(
        &self,
        pool: &str,
        kind: PoolKind,
        flags: ReportFlags,
    ) -> AppResult<TokenReport> {
        let pool = parse_address(pool)?;
        info!(pool = %pool, kind = %kind, count_trades = flags.count_trades, "🔍 Building report");

        let state = Arc::new(self.services.read_pool(pool, kind).await?);
        let token = state.identity.token();

        let s = self.services.clone();
        let metadata = tokio::spawn(async move { s.token_metadata(token).await });
        let s = self.services.clone();
        let security = tokio::spawn(async move { s.security(token, pool).await });
        let s = self.services.clone();
        let market = tokio::spawn(async move { s.market(token).await });
        let s = self.services.clone();
        let source = tokio::spawn(async move { s.source_code(token).await });
        let s = self.services.clone();
        let price = tokio::spawn(async move { s.reference_price().await });
        let (s, st) = (self.services.clone(), state.clone());
        let locks = tokio::spawn(async move { s.locks(&st).await });
        let (s, st) = (self.services.clone(), state.clone());
        let initial = tokio::spawn(async move { s.initial_reserves(&st).await });
        let swaps = flags.count_trades.then(|| {
            let (s, st) = (self.services.clone(), state.clone());
            tokio::spawn(async move { s.recent_swaps(&st).await })
        });

        let (metadata, security, market, source, price, locks, initial) =
            tokio::join!(metadata, security, market, source, price, locks, initial);
        let swaps = match swaps {
            Some(handle) => Some(joined(handle.await)?),
            None => None,
        };

        let report = assemble(
            &state,
            Enrichment {
                metadata: joined(metadata)?,
                security: joined(security)?,
                market: joined(market)?,
                source: joined(source)?,
                reference_price: joined(price)?,
                locks: joined(locks)?,
                initial: joined(initial)?,
                swaps,
            },
        );

        let degraded = report.provenance.values().filter(|p| !p.is_ok()).count();
        info!(pool = %pool, token = %report.token_address, degraded, "✅ Report assembled");
        Ok(report)
    }
}

// ============================================
// Merge
// ============================================

/// Joined enrichment results, one per field group
struct Enrichment {
    metadata: (Sourced<TokenMetadata>, Sourced<Option<Address>>),
    security: Sourced<SecurityAssessment>,
    market: Sourced<MarketData>,
    source: Sourced<Option<String>>,
    reference_price: Sourced<Option<f64>>,
    locks: Sourced<Vec<LockRecord>>,
    initial: Sourced<Option<ReserveSnapshot>>,
    swaps: Option<Sourced<LogBatch<SwapEvent>>>,
}

fn assemble(state: &PoolState, e: Enrichment) -> TokenReport {
    let mut provenance = BTreeMap::new();
    let mut track = |group: &'static str, p: Provenance| {
        provenance.insert(group, p);
    };

    let (metadata, owner) = e.metadata;
    track("token", metadata.provenance());
    track("owner", owner.provenance());
    track("security", e.security.provenance());
    track("market", e.market.provenance());
    track("source_code", e.source.provenance());
    track("reference_price", e.reference_price.provenance());
    track("locks", e.locks.provenance());
    track("initial_liquidity", e.initial.provenance());
    if let Some(swaps) = &e.swaps {
        track("trades", swaps.provenance());
    }

    let id = &state.identity;
    let side = id.reference_side;
    let metadata = metadata.into_value();
    let owner = owner.into_value();
    let security = e.security.into_value();
    let market = e.market.into_value();
    let source = e.source.into_value();

    let token_supply = metrics::decimal_supply(metadata.total_supply, metadata.decimals);
    let pooled_eth = metrics::pooled_reference(&state.reserves, side);
    let pooled_eth_initial = e
        .initial
        .into_value()
        .map(|snapshot| metrics::pooled_reference(&snapshot, side));

    let (counts, trades_truncated) = match e.swaps.map(Sourced::into_value) {
        Some(batch) => (metrics::classify_trades(&batch.entries, side), !batch.is_complete()),
        None => (Default::default(), false),
    };

    let links = metrics::merge_links(
        source.as_deref().map(metrics::extract_source_links).unwrap_or_default(),
        market.links,
    );

    TokenReport {
        pool_type: id.kind,
        pool_address: id.pool,
        token_address: id.token(),
        pool_fee: id.fee,
        token_name: metadata.name,
        token_symbol: metadata.symbol,
        token_decimals: metadata.decimals,
        token_supply,
        price: market.price_usd,
        market_cap: metrics::market_cap(token_supply, market.price_usd),
        pooled_eth,
        pooled_eth_initial,
        current_liquidity: metrics::current_liquidity(pooled_eth, e.reference_price.into_value()),
        pool_growth: metrics::pool_growth(pooled_eth, pooled_eth_initial),
        token_holders: market.holder_count,
        buys_24h: counts.buys,
        sells_24h: counts.sells,
        trades_truncated,
        buy_tax: metrics::combined_tax(id.kind, security.buy_tax, id.fee),
        sell_tax: metrics::combined_tax(id.kind, security.sell_tax, id.fee),
        buy_gas: security.buy_gas,
        sell_gas: security.sell_gas,
        max_buy: security.max_buy,
        max_sell: security.max_sell,
        owner,
        is_honeypot: security.is_honeypot,
        is_scam: market.is_scam,
        verified: metrics::is_verified(source.as_deref()),
        renounced: metrics::is_renounced(owner),
        links,
        locks: e.locks.into_value(),
        provenance,
    }
}
