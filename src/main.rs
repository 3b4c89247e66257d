//! pairscope CLI - one pool report, printed as the API envelope
//!
//! Usage:
//!   pairscope <pool-address> [--v3] [--count-trades]
//!
//! Environment: see `AppConfig::from_env` (ETH_HTTP_URL or ALCHEMY_API_KEY required)

use pairscope::api::envelope;
use pairscope::{AppConfig, PoolKind, ReportAggregator, ReportFlags, Services};

use eyre::{eyre, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct Args {
    pool: String,
    kind: PoolKind,
    flags: ReportFlags,
}

fn parse_args() -> Result<Args> {
    let mut pool = None;
    let mut kind = PoolKind::UniswapV2;
    let mut flags = ReportFlags::default();

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--v3" => kind = PoolKind::UniswapV3,
            "--count-trades" => flags.count_trades = true,
            flag if flag.starts_with("--") => return Err(eyre!("unknown flag {}", flag)),
            _ if pool.is_none() => pool = Some(arg.clone()),
            _ => return Err(eyre!("unexpected argument {}", arg)),
        }
    }

    let pool = pool.ok_or_else(|| eyre!("usage: pairscope <pool-address> [--v3] [--count-trades]"))?;
    Ok(Args { pool, kind, flags })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays pipeable JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = parse_args()?;
    let config = AppConfig::from_env().map_err(|e| eyre!("{}", e))?;
    let services = Services::from_config(&config).map_err(|e| eyre!("{}", e))?;
    let reports = ReportAggregator::new(Arc::new(services));

    let result = reports.build_report(&args.pool, args.kind, args.flags).await;
    let (_, body) = envelope(&result);
    println!("{}", serde_json::to_string_pretty(&body)?);

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
