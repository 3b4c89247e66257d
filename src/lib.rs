//! pairscope
//!
//! Due-diligence reports for Uniswap V2/V3 liquidity pools paired with
//! wrapped ether. One report combines:
//! - Pool identity, reserves and initial liquidity from chain reads
//! - Liquidity locks across Unicrypt, Team Finance and the burn address
//! - Buy/sell counts from swap logs, fetched with range bisection
//! - Simulated taxes and honeypot verdicts from a security oracle
//! - Price, scam flag and links from a market data oracle
//!
//! Every enrichment source may fail independently; the report records
//! which field groups fell back to defaults.

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{QuoteEngine, ReportAggregator, Services};
pub use models::{AppConfig, AppError, AppResult, PoolKind, ReportFlags, TokenReport};
