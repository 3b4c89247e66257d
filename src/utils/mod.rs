//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, ABI bindings and log decoding, the oracle rate limiter and
//! input validation.

pub mod constants;
pub mod decoder;
pub mod rate_limiter;
pub mod validation;

pub use constants::*;
pub use rate_limiter::RateLimiter;
pub use validation::parse_address;
