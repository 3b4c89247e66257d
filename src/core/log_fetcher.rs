//! Range-bisecting event log fetcher
//!
//! One query per range. When the provider rejects a range as too large the
//! range is split at its midpoint and both halves are fetched concurrently,
//! then concatenated left-then-right. Any other failure drops that subtree.
//! Splitting stops at `min_span` / `max_depth`; whatever was lost there is
//! reported through `LogBatch::truncated`.

use alloy_primitives::Address;
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::ChainClient;
use crate::models::config::LogFetchConfig;
use crate::models::types::{LogFilter, PoolKind, RawLog, SwapEvent};
use crate::providers::rpc::{is_range_too_large, rpc_error};
use crate::utils::decoder::{decode_swap, swap_topic};

/// Where bisection gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BisectionLimits {
    /// Ranges spanning this many blocks or fewer are never split
    pub min_span: u64,
    /// Maximum recursion depth below the initial range
    pub max_depth: u32,
}

impl Default for BisectionLimits {
    fn default() -> Self {
        let cfg = LogFetchConfig::default();
        Self {
            min_span: cfg.min_span,
            max_depth: cfg.max_depth,
        }
    }
}

impl From<&LogFetchConfig> for BisectionLimits {
    fn from(cfg: &LogFetchConfig) -> Self {
        Self {
            min_span: cfg.min_span.max(1),
            max_depth: cfg.max_depth,
        }
    }
}

/// Best-effort result of a ranged fetch
#[derive(Debug, Clone, PartialEq)]
pub struct LogBatch<T> {
    /// Block-ordered entries
    pub entries: Vec<T>,
    /// Some rejected range could not be split further
    pub truncated: bool,
    /// Subranges dropped because of non-range errors
    pub failed_ranges: u32,
}

impl<T> LogBatch<T> {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            truncated: false,
            failed_ranges: 0,
        }
    }

    fn complete(entries: Vec<T>) -> Self {
        Self {
            entries,
            truncated: false,
            failed_ranges: 0,
        }
    }

    fn truncated() -> Self {
        Self {
            truncated: true,
            ..Self::empty()
        }
    }

    fn failed() -> Self {
        Self {
            failed_ranges: 1,
            ..Self::empty()
        }
    }

    /// Left then right; ranges are contiguous so order is preserved
    fn concat(mut self, right: Self) -> Self {
        self.entries.extend(right.entries);
        self.truncated |= right.truncated;
        self.failed_ranges += right.failed_ranges;
        self
    }

    pub fn is_complete(&self) -> bool {
        !self.truncated && self.failed_ranges == 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filter_map<U>(self, f: impl FnMut(T) -> Option<U>) -> LogBatch<U> {
        LogBatch {
            entries: self.entries.into_iter().filter_map(f).collect(),
            truncated: self.truncated,
            failed_ranges: self.failed_ranges,
        }
    }
}

/// Bisecting fetcher over a shared chain client
#[derive(Clone)]
pub struct LogFetcher {
    client: Arc<dyn ChainClient>,
    limits: BisectionLimits,
}

impl LogFetcher {
    pub fn new(client: Arc<dyn ChainClient>, limits: BisectionLimits) -> Self {
        Self { client, limits }
    }

    pub fn limits(&self) -> BisectionLimits {
        self.limits
    }

    /// Fetch all logs matching `filter` over its range. Never fails; losses
    /// are reported on the batch.
    pub async fn fetch_logs(&self, filter: &LogFilter) -> LogBatch<RawLog> {
        let batch = self.fetch_range(filter.clone(), 0).await;
        if !batch.is_complete() {
            warn!(
                address = %filter.address,
                from = filter.from_block,
                to = filter.to_block,
                truncated = batch.truncated,
                failed_ranges = batch.failed_ranges,
                "⚠️ Partial log fetch"
            );
        }
        batch
    }

    /// Swap events of `pool` in `[from_block, to_block]`
    pub async fn fetch_swaps(
        &self,
        pool: Address,
        kind: PoolKind,
        from_block: u64,
        to_block: u64,
    ) -> LogBatch<SwapEvent> {
        let filter = LogFilter::new(pool, swap_topic(kind), from_block, to_block);
        self.fetch_logs(&filter)
            .await
            .filter_map(|log| decode_swap(kind, &log))
    }

    /// Earliest matching log, searching the filter's range once.
    ///
    /// Some providers refuse wide ranges but name a range they would serve;
    /// in that case that range is queried instead (one retry, no bisection).
    pub async fn fetch_earliest(&self, filter: &LogFilter) -> eyre::Result<Option<RawLog>> {
        let logs = match self.client.get_logs(filter).await {
            Ok(logs) => logs,
            Err(e) => {
                let suggested = rpc_error(&e).and_then(|rpc| rpc.suggested_range());
                match suggested {
                    Some((from, to)) => {
                        debug!(from, to, "🔁 Retrying log query with provider-suggested range");
                        self.client.get_logs(&filter.with_range(from, to)).await?
                    }
                    None => return Err(e),
                }
            }
        };
        Ok(logs
            .into_iter()
            .min_by_key(|log| (log.block_number, log.log_index)))
    }

    fn fetch_range(&self, filter: LogFilter, depth: u32) -> BoxFuture<'_, LogBatch<RawLog>> {
        async move {
            if filter.from_block > filter.to_block {
                return LogBatch::empty();
            }

            match self.client.get_logs(&filter).await {
                Ok(mut logs) => {
                    logs.sort_by_key(|log| (log.block_number, log.log_index));
                    LogBatch::complete(logs)
                }
                Err(e) if is_range_too_large(&e) => {
                    let span = filter.to_block - filter.from_block + 1;
                    if span <= self.limits.min_span || depth >= self.limits.max_depth {
                        warn!(
                            from = filter.from_block,
                            to = filter.to_block,
                            depth,
                            "✂️ Range still too large at bisection limit, skipping"
                        );
                        return LogBatch::truncated();
                    }

                    let mid = filter.from_block + (filter.to_block - filter.from_block) / 2;
                    debug!(from = filter.from_block, mid, to = filter.to_block, depth, "🔀 Bisecting log range");

                    let (left, right) = tokio::join!(
                        self.fetch_range(filter.with_range(filter.from_block, mid), depth + 1),
                        self.fetch_range(filter.with_range(mid + 1, filter.to_block), depth + 1),
                    );
                    left.concat(right)
                }
                Err(e) => {
                    warn!(
                        from = filter.from_block,
                        to = filter.to_block,
                        "⚠️ Log query failed, dropping range: {}",
                        e
                    );
                    LogBatch::failed()
                }
            }
        }
        .boxed()
    }
}
