//! pairscope API Server
//!
//! Usage:
//!   cargo run --bin pairscope_api
//!
//! Environment:
//!   PORT / PAIRSCOPE_PORT - Server port (default: 8080)
//!   PAIRSCOPE_HOST        - Server host (default: 0.0.0.0)
//!   RUST_LOG              - Log filter (default: info)
//!   plus everything read by `AppConfig::from_env`

use pairscope::api::{create_router, AppState};
use pairscope::{AppConfig, QuoteEngine, ReportAggregator, Services};
use eyre::eyre;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env().map_err(|e| eyre!("{}", e))?;
    let services = Arc::new(Services::from_config(&config).map_err(|e| eyre!("{}", e))?);

    let state = Arc::new(AppState::new(
        ReportAggregator::new(services.clone()),
        QuoteEngine::new(services.chain.clone()),
    ));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🚀 pairscope API starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET /v2/pair-details/:address[?count_trades=true]");
    info!("  GET /v3/pair-details/:address[?count_trades=true]");
    info!("  GET /v2/quote?address&type&amountIn[&slippageBips]");
    info!("  GET /v3/quote?address&type&feeAmount&amountIn[&slippageBips]");
    info!("  GET /health");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 pairscope API shutdown complete");
    Ok(())
}
