//! API Request/Response Types
//!
//! Every response uses the same envelope:
//! `{ "success": true, "result": <payload> }` or
//! `{ "success": false, "result": { "error": "<message>" } }`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::ReportFlags;

/// Shown instead of the real message for unexpected failures
const GENERIC_FAILURE: &str = "Errored while retrieving pair details";

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub result: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

/// Error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiResponse<ApiError> {
    pub fn error(err: &AppError) -> Self {
        let message = match err.code {
            ErrorCode::Unknown => GENERIC_FAILURE.to_string(),
            _ => err.message.clone(),
        };
        Self {
            success: false,
            result: ApiError { error: message },
        }
    }
}

/// HTTP status and envelope body for a pipeline result
pub fn envelope<T: Serialize>(result: &AppResult<T>) -> (u16, Value) {
    match result {
        Ok(payload) => match serde_json::to_value(ApiResponse::success(payload)) {
            Ok(body) => (200, body),
            Err(e) => {
                error!("❌ Failed to serialize response: {}", e);
                (500, json!(ApiResponse::error(&AppError::internal(GENERIC_FAILURE))))
            }
        },
        Err(err) => {
            if err.http_status() >= 500 {
                error!(code = err.code_str(), "❌ Request aborted: {}", err);
            } else if !err.code.is_validation() {
                warn!(code = err.code_str(), "⚠️ Request failed: {}", err);
            }
            (err.http_status(), json!(ApiResponse::error(err)))
        }
    }
}

// ============================================
// Pair Details
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct PairDetailsQuery {
    pub count_trades: Option<String>,
}

impl PairDetailsQuery {
    pub fn flags(&self) -> ReportFlags {
        ReportFlags {
            count_trades: self
                .count_trades
                .as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
        }
    }
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let (status, body) = envelope::<()>(&Err(AppError::invalid_address()));
        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({"success": false, "result": {"error": "Invalid Ethereum address provided"}})
        );
    }

    #[test]
    fn test_unknown_errors_are_masked() {
        let (status, body) = envelope::<()>(&Err(AppError::from(eyre::eyre!("socket hang up at 10.0.0.3"))));
        assert_eq!(status, 500);
        assert_eq!(body["result"]["error"], GENERIC_FAILURE);
    }

    #[test]
    fn test_count_trades_flag() {
        let q = PairDetailsQuery { count_trades: Some("true".into()) };
        assert!(q.flags().count_trades);
        let q = PairDetailsQuery { count_trades: Some("no".into()) };
        assert!(!q.flags().count_trades);
        assert!(!PairDetailsQuery::default().flags().count_trades);
    }
}
