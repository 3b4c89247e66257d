//! pairscope HTTP API
//! Pair reports and trade quotes for Uniswap V2/V3 pools

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
