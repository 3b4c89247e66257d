//! Liquidity lock discovery
//!
//! Three independent sources, in output order:
//! 1. Unicrypt: enumerable per-pool lock slots `0..N`
//! 2. Team Finance: `Deposit` logs for the pool, each resolved by lock id
//! 3. Burn: pool shares held by the burn address (never unlock)
//!
//! Pool-share total supply is read once and gates everything. Each registry
//! is all-or-nothing: one failed read drops that registry's records and marks
//! the result degraded, the other registries still report.

use alloy_primitives::{Address, U256};
use eyre::{eyre, Result};
use futures_util::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::log_fetcher::LogFetcher;
use super::metrics::percent_of_supply;
use super::traits::{call_contract, ChainClient};
use crate::models::types::{BlockRef, LockRecord, LockSource, LogFilter, Sourced};
use crate::utils::constants::{BURN_ADDRESS, TEAM_FINANCE_LOCKER, UNICRYPT_LOCKER};
use crate::utils::decoder::{
    address_topic, decode_deposit_id, IUnicryptLocker, ITeamFinanceLocker, IERC20,
};
use alloy_sol_types::SolEvent;

/// Registry addresses, overridable for forks and tests
#[derive(Debug, Clone, Copy)]
pub struct LockRegistries {
    pub unicrypt: Address,
    pub team_finance: Address,
    pub burn: Address,
    /// First block scanned for Team Finance deposits
    pub team_finance_from_block: u64,
}

impl Default for LockRegistries {
    fn default() -> Self {
        Self {
            unicrypt: UNICRYPT_LOCKER,
            team_finance: TEAM_FINANCE_LOCKER,
            burn: BURN_ADDRESS,
            team_finance_from_block: 0,
        }
    }
}

pub struct LockAggregator {
    chain: Arc<dyn ChainClient>,
    fetcher: LogFetcher,
    registries: LockRegistries,
}

impl LockAggregator {
    pub fn new(chain: Arc<dyn ChainClient>, fetcher: LogFetcher, registries: LockRegistries) -> Self {
        Self {
            chain,
            fetcher,
            registries,
        }
    }

    /// Active locks on `pool`'s shares as of the current chain head
    pub async fn list_locks(&self, pool: Address) -> Sourced<Vec<LockRecord>> {
        match self.chain.latest_block().await {
            Ok(head) => self.list_locks_at(pool, head).await,
            Err(e) => {
                warn!(pool = %pool, "⚠️ Lock discovery aborted, chain head unavailable: {}", e);
                Sourced::degraded(Vec::new(), "chain head unavailable")
            }
        }
    }

    /// Active locks as of `head`: records unlocking at or before
    /// `head.timestamp` are dropped, deposits are scanned up to `head.number`
    pub async fn list_locks_at(&self, pool: Address, head: BlockRef) -> Sourced<Vec<LockRecord>> {
        let total_supply = match call_contract(&*self.chain, pool, IERC20::totalSupplyCall {}).await {
            Ok(ret) => ret._0,
            Err(e) => {
                warn!(pool = %pool, "⚠️ Lock discovery aborted, totalSupply failed: {}", e);
                return Sourced::degraded(Vec::new(), "pool totalSupply unavailable");
            }
        };
        if total_supply.is_zero() {
            return Sourced::degraded(Vec::new(), "pool totalSupply is zero");
        }

        let (unicrypt, team_finance, burn) = tokio::join!(
            self.unicrypt_locks(pool, total_supply),
            self.team_finance_locks(pool, total_supply, head.number),
            self.burned(pool, total_supply),
        );

        let mut records = Vec::new();
        let mut problems = Vec::new();
        for (source, result) in [
            ("unicrypt", unicrypt),
            ("team_finance", team_finance),
            ("burn", burn),
        ] {
            match result {
                Ok((found, partial)) => {
                    records.extend(found);
                    if let Some(reason) = partial {
                        problems.push(format!("{}: {}", source, reason));
                    }
                }
                Err(e) => {
                    warn!(pool = %pool, source, "⚠️ Lock registry read failed: {}", e);
                    problems.push(format!("{}: registry read failed", source));
                }
            }
        }

        records.retain(|lock| lock.unlocks.map_or(true, |t| t > head.timestamp));
        info!(pool = %pool, count = records.len(), "🔒 Locks discovered");

        if problems.is_empty() {
            Sourced::Fresh(records)
        } else {
            Sourced::degraded(records, problems.join("; "))
        }
    }

    async fn unicrypt_locks(&self, pool: Address, total_supply: U256) -> Result<(Vec<LockRecord>, Option<String>)> {
        let registry = self.registries.unicrypt;
        let count = call_contract(
            &*self.chain,
            registry,
            IUnicryptLocker::getNumLocksForTokenCall { lpToken: pool },
        )
        .await?
        ._0;
        let count: u64 = count
            .try_into()
            .map_err(|_| eyre!("implausible lock count {}", count))?;
        debug!(pool = %pool, count, "Unicrypt lock slots");

        let slots = (0..count).map(|index| {
            call_contract(
                &*self.chain,
                registry,
                IUnicryptLocker::tokenLocksCall {
                    lpToken: pool,
                    index: U256::from(index),
                },
            )
        });
        let locks = try_join_all(slots).await?;

        Ok((
            locks
                .into_iter()
                .map(|lock| LockRecord {
                    locker: LockSource::Unicrypt,
                    amount: lock.amount,
                    unlocks: Some(saturating_u64(lock.unlockDate)),
                    percent: percent_of_supply(lock.amount, total_supply),
                })
                .collect(),
            None,
        ))
    }

    async fn team_finance_locks(
        &self,
        pool: Address,
        total_supply: U256,
        to_block: u64,
    ) -> Result<(Vec<LockRecord>, Option<String>)> {
        let registry = self.registries.team_finance;
        let filter = LogFilter::new(
            registry,
            ITeamFinanceLocker::Deposit::SIGNATURE_HASH,
            self.registries.team_finance_from_block,
            to_block,
        )
        .with_topic(1, address_topic(pool));

        let deposits = self.fetcher.fetch_logs(&filter).await;
        let partial = (!deposits.is_complete()).then(|| {
            format!(
                "deposit scan incomplete (truncated: {}, failed ranges: {})",
                deposits.truncated, deposits.failed_ranges
            )
        });
        let ids: Vec<U256> = deposits
            .entries
            .iter()
            .filter_map(decode_deposit_id)
            .collect();

        let lookups = ids.iter().map(|id| {
            call_contract(&*self.chain, registry, ITeamFinanceLocker::lockedTokenCall { id: *id })
        });
        let locks = try_join_all(lookups).await?;

        Ok((
            locks
                .into_iter()
                .filter(|lock| lock.tokenAddress == pool && !lock.withdrawn)
                .map(|lock| LockRecord {
                    locker: LockSource::TeamFinance,
                    amount: lock.tokenAmount,
                    unlocks: Some(saturating_u64(lock.unlockTime)),
                    percent: percent_of_supply(lock.tokenAmount, total_supply),
                })
                .collect(),
            partial,
        ))
    }

    async fn burned(&self, pool: Address, total_supply: U256) -> Result<(Vec<LockRecord>, Option<String>)> {
        let balance = call_contract(
            &*self.chain,
            pool,
            IERC20::balanceOfCall {
                account: self.registries.burn,
            },
        )
        .await?
        ._0;

        let records = if balance.is_zero() {
            Vec::new()
        } else {
            vec![LockRecord {
                locker: LockSource::Burn,
                amount: balance,
                unlocks: None,
                percent: percent_of_supply(balance, total_supply),
            }]
        };
        Ok((records, None))
    }
}

fn saturating_u64(value: U256) -> u64 {
    value.try_into().unwrap_or(u64::MAX)
}
