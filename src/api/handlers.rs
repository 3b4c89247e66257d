//! API Request Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use super::types::*;
use crate::core::quote::{QuoteEngine, QuoteParams};
use crate::core::report::ReportAggregator;
use crate::models::errors::AppResult;
use crate::models::types::PoolKind;

/// Shared application state
pub struct AppState {
    pub reports: ReportAggregator,
    pub quotes: QuoteEngine,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(reports: ReportAggregator, quotes: QuoteEngine) -> Self {
        Self {
            reports,
            quotes,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn respond<T: Serialize>(result: AppResult<T>) -> Response {
    let (status, body) = envelope(&result);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::success(HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    }))
}

// ============================================
// Pair Details
// ============================================

pub async fn pair_details_v2(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(query): Query<PairDetailsQuery>,
) -> Response {
    respond(
        state
            .reports
            .build_report(&address, PoolKind::UniswapV2, query.flags())
            .await,
    )
}

pub async fn pair_details_v3(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(query): Query<PairDetailsQuery>,
) -> Response {
    respond(
        state
            .reports
            .build_report(&address, PoolKind::UniswapV3, query.flags())
            .await,
    )
}

// ============================================
// Quotes
// ============================================

pub async fn quote_v2(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Response {
    respond(state.quotes.quote(PoolKind::UniswapV2, &params).await)
}

pub async fn quote_v3(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Response {
    respond(state.quotes.quote(PoolKind::UniswapV3, &params).await)
}
