//! Centralized Error Handling Module
//!
//! Every failure that can reach a caller carries a unique error code.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - INPUT_xxx: request validation (rejected before any I/O)
//! - POOL_xxx: mandatory pool reads
//! - QUOTE_xxx: trade quoting
//! - RPC_xxx / EXT_xxx: upstream transport
//! - CFG_xxx: configuration

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message, safe to return to clients
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// HTTP status this error maps to at the API boundary
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Input Validation Errors
    // ============================================
    /// Malformed address
    InputInvalidAddress,
    /// Malformed or out-of-range query parameter
    InputInvalidParameter,
    /// Required query parameter absent
    InputMissingParameter,

    // ============================================
    // Pool Errors
    // ============================================
    /// Mandatory pool reads failed (no such pool on the protocol)
    PoolNotFound,
    /// Neither pool asset is the reference asset
    PoolNoReferenceAsset,

    // ============================================
    // Quote Errors
    // ============================================
    /// No quote could be produced for the trade
    QuoteUnavailable,

    // ============================================
    // RPC Errors
    // ============================================
    /// RPC request failed at the transport level
    RpcConnectionFailed,
    /// Invalid RPC response
    RpcInvalidResponse,

    // ============================================
    // External Service Errors
    // ============================================
    /// External service timeout
    ExternalTimeout,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Missing API key / endpoint
    ConfigMissingApiKey,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unexpected abort while assembling a response
    Internal,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputInvalidAddress => "INPUT_INVALID_ADDRESS",
            Self::InputInvalidParameter => "INPUT_INVALID_PARAMETER",
            Self::InputMissingParameter => "INPUT_MISSING_PARAMETER",

            Self::PoolNotFound => "POOL_NOT_FOUND",
            Self::PoolNoReferenceAsset => "POOL_NO_REFERENCE_ASSET",

            Self::QuoteUnavailable => "QUOTE_UNAVAILABLE",

            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            Self::ExternalTimeout => "EXT_TIMEOUT",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigMissingApiKey => "CFG_MISSING_API_KEY",

            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    ///
    /// Expected validation and lookup failures are logical failures carried in
    /// the envelope with 200. Only unexpected aborts surface as 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Internal | Self::Unknown => 500,
            _ => 200,
        }
    }

    /// Failures the caller caused (tier a), as opposed to upstream trouble
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InputInvalidAddress | Self::InputInvalidParameter | Self::InputMissingParameter
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Invalid address
    pub fn invalid_address() -> Self {
        Self::new(ErrorCode::InputInvalidAddress, "Invalid Ethereum address provided")
    }

    /// Invalid query parameter
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InputInvalidParameter, msg)
    }

    /// Missing query parameter
    pub fn missing_parameter(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InputMissingParameter, msg)
    }

    /// Pool does not exist on the given protocol
    pub fn pool_not_found(protocol: &str) -> Self {
        Self::new(
            ErrorCode::PoolNotFound,
            format!("Address does not correspond to existing pair on {}", protocol),
        )
    }

    /// Neither side is the reference asset
    pub fn no_reference_asset() -> Self {
        Self::new(
            ErrorCode::PoolNoReferenceAsset,
            "At least one token in pair must be wrapped ether",
        )
    }

    /// Quote could not be produced
    pub fn quote_unavailable() -> Self {
        Self::new(ErrorCode::QuoteUnavailable, "Could not quote this trade!")
    }

    /// Missing API key
    pub fn missing_api_key(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingApiKey,
            format!("Missing API key: {}", key_name),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {}", key, value),
        )
    }

    /// Internal error while assembling a response
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::invalid_address();
        assert_eq!(err.code, ErrorCode::InputInvalidAddress);
        assert_eq!(err.code_str(), "INPUT_INVALID_ADDRESS");
        assert_eq!(err.message, "Invalid Ethereum address provided");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::InputInvalidAddress.http_status(), 200);
        assert_eq!(ErrorCode::PoolNotFound.http_status(), 200);
        assert_eq!(ErrorCode::QuoteUnavailable.http_status(), 200);
        assert_eq!(ErrorCode::Internal.http_status(), 500);
    }

    #[test]
    fn test_pool_not_found_names_protocol() {
        let err = AppError::pool_not_found("Uniswap V3");
        assert_eq!(
            err.message,
            "Address does not correspond to existing pair on Uniswap V3"
        );
        assert!(!err.code.is_validation());
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::quote_unavailable();
        assert_eq!(err.to_string(), "[QUOTE_UNAVAILABLE] Could not quote this trade!");
    }
}
