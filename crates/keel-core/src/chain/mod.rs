//! Normalized chain records.
//!
//! Nodes return loosely typed JSON objects whose integer fields are hex
//! strings. The records here decode the fields the facade and the ingestion
//! loop depend on and nothing more. A record is always built from a single
//! endpoint's response.
//!
//! Decoding is strict about required fields and lenient about encodings: a
//! missing `hash` on a transaction is an error, while a decimal `nonce` is
//! accepted. A `null` payload (unknown block, pending receipt) is an error so
//! the fan-out executor moves on to the next endpoint.

pub mod block;
pub mod fees;
pub mod receipt;
pub mod transaction;

pub use block::{BlockRecord, BlockTransactions};
pub use fees::FeeData;
pub use receipt::Receipt;
pub use transaction::{GasPricing, TransactionRecord};

use serde_json::Value;

use crate::{upstream::UpstreamError, utils::quantity::QuantityError};

/// Maps a field decoding failure to the upstream error taxonomy.
pub(crate) fn field_error(record: &str, field: &str, e: &QuantityError) -> UpstreamError {
    UpstreamError::InvalidResponse(format!("{record}.{field}: {e}"))
}

pub(crate) fn missing(record: &str, field: &str) -> UpstreamError {
    UpstreamError::InvalidResponse(format!("{record}.{field} missing"))
}

/// Rejects `null` and non-object payloads.
pub(crate) fn expect_object<'a>(record: &str, value: &'a Value) -> Result<&'a Value, UpstreamError> {
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Err(UpstreamError::InvalidResponse(format!("{record} not found"))),
        other => Err(UpstreamError::InvalidResponse(format!("{record}: expected object, got {other}"))),
    }
}
