//! Request input validation. Runs before any I/O.

use alloy_primitives::Address;
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::errors::{AppError, AppResult};

lazy_static! {
    static ref ETH_ADDRESS: Regex = Regex::new(r"^(0x)?[0-9a-fA-F]{40}$").expect("static regex");
}

/// 40 hex digits, `0x` prefix optional, any letter case
pub fn is_address(input: &str) -> bool {
    ETH_ADDRESS.is_match(input)
}

/// Parse a user-supplied address. Checksums are not enforced.
pub fn parse_address(input: &str) -> AppResult<Address> {
    let input = input.trim();
    if !is_address(input) {
        return Err(AppError::invalid_address());
    }
    let hex = input.strip_prefix("0x").unwrap_or(input);
    hex.parse::<Address>().map_err(|_| AppError::invalid_address())
}
