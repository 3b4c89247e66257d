//! Core Module - Aggregation Pipeline
//!
//! Collaborator traits, the bisecting log fetcher, lock discovery, pure
//! metrics, report aggregation and trade quoting.

pub mod locks;
pub mod log_fetcher;
pub mod metrics;
pub mod quote;
pub mod report;
pub mod traits;

pub use locks::{LockAggregator, LockRegistries};
pub use log_fetcher::{BisectionLimits, LogBatch, LogFetcher};
pub use quote::{Quote, QuoteEngine, QuoteParams};
pub use report::{ReportAggregator, Services};
pub use traits::{ChainClient, MarketOracle, ReferencePriceFeed, SecurityOracle, SourceCodeProvider};
