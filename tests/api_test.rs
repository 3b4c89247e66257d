//! HTTP surface tests: routing, envelopes and status codes

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::*;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use pairscope::api::{create_router, AppState};
use pairscope::core::traits::ChainClient;
use pairscope::{QuoteEngine, ReportAggregator};

fn app() -> Router {
    let chain = Arc::new(MockChain::new());
    let quotes = QuoteEngine::new(chain.clone() as Arc<dyn ChainClient>);
    let reports = ReportAggregator::new(Arc::new(services(chain)));
    create_router(Arc::new(AppState::new(reports, quotes)))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["status"], "healthy");
}

#[tokio::test]
async fn test_pair_details_invalid_address() {
    let (status, body) = get("/v2/pair-details/0xZZZ").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["result"]["error"], "Invalid Ethereum address provided");
}

#[tokio::test]
async fn test_pair_details_unknown_pool() {
    let uri = format!("/v3/pair-details/{:?}?count_trades=true", POOL);
    let (status, body) = get(&uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["result"]["error"],
        "Address does not correspond to existing pair on Uniswap V3"
    );
}

#[tokio::test]
async fn test_quote_requires_fee_on_v3() {
    let uri = format!("/v3/quote?address={:?}&type=buy&amountIn=1000", TOKEN);
    let (status, body) = get(&uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["result"]["error"], "feeAmount is required");
}

#[tokio::test]
async fn test_quote_rejects_bad_type() {
    let uri = format!("/v2/quote?address={:?}&type=swap&amountIn=1000", TOKEN);
    let (_, body) = get(&uri).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["result"]["error"], "Invalid type provided");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = app()
        .oneshot(Request::builder().uri("/v4/quote").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let id = response.headers().get("x-request-id").unwrap();
    assert_eq!(id.to_str().unwrap().len(), 36);
}
