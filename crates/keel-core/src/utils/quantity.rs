//! Hex quantity encoding and decoding for JSON-RPC values.
//!
//! Nodes encode integers as `0x`-prefixed, big-endian hex without leading zeros.
//! Some public endpoints return decimal strings or plain JSON numbers instead,
//! so decoding accepts all three.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("invalid hex quantity: {0}")]
    InvalidHex(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("expected a quantity, got {0}")]
    UnexpectedType(String),
}

/// Formats a `u64` as a `0x`-prefixed quantity. Zero is formatted as `0x0`.
#[must_use]
pub fn format_hex_u64(value: u64) -> String {
    format!("0x{value:x}")
}

/// Parses a quantity string into a `u64`.
///
/// # Errors
/// Returns [`QuantityError`] if the string is neither hex nor decimal.
pub fn parse_u64(raw: &str) -> Result<u64, QuantityError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if hex.is_empty() {
            return Ok(0);
        }
        u64::from_str_radix(hex, 16).map_err(|_| QuantityError::InvalidHex(raw.to_string()))
    } else {
        raw.parse::<u64>().map_err(|_| QuantityError::InvalidNumber(raw.to_string()))
    }
}

/// Parses a quantity string into a `u128`. Wei amounts fit comfortably.
///
/// # Errors
/// Returns [`QuantityError`] if the string is neither hex nor decimal.
pub fn parse_u128(raw: &str) -> Result<u128, QuantityError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if hex.is_empty() {
            return Ok(0);
        }
        u128::from_str_radix(hex, 16).map_err(|_| QuantityError::InvalidHex(raw.to_string()))
    } else {
        raw.parse::<u128>().map_err(|_| QuantityError::InvalidNumber(raw.to_string()))
    }
}

/// Decodes a JSON value (string or number) into a `u64`.
///
/// # Errors
/// Returns [`QuantityError`] for non-numeric values.
pub fn value_to_u64(value: &Value) -> Result<u64, QuantityError> {
    match value {
        Value::String(s) => parse_u64(s),
        Value::Number(n) => n.as_u64().ok_or_else(|| QuantityError::InvalidNumber(n.to_string())),
        other => Err(QuantityError::UnexpectedType(other.to_string())),
    }
}

/// Decodes a JSON value (string or number) into a `u128`.
///
/// # Errors
/// Returns [`QuantityError`] for non-numeric values.
pub fn value_to_u128(value: &Value) -> Result<u128, QuantityError> {
    match value {
        Value::String(s) => parse_u128(s),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| QuantityError::InvalidNumber(n.to_string())),
        other => Err(QuantityError::UnexpectedType(other.to_string())),
    }
}

/// Reads an optional quantity field: absent or `null` is `Ok(None)`.
///
/// # Errors
/// Returns [`QuantityError`] when the field is present but malformed.
pub fn field_u64(object: &Value, key: &str) -> Result<Option<u64>, QuantityError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => value_to_u64(v).map(Some),
    }
}

/// `u128` counterpart of [`field_u64`].
///
/// # Errors
/// Returns [`QuantityError`] when the field is present but malformed.
pub fn field_u128(object: &Value, key: &str) -> Result<Option<u128>, QuantityError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => value_to_u128(v).map(Some),
    }
}

/// Reads an optional string field: absent or `null` is `None`.
#[must_use]
pub fn field_str(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}
