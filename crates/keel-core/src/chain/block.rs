use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{expect_object, field_error, missing, transaction::TransactionRecord};
use crate::{
    upstream::UpstreamError,
    utils::quantity::{field_str, field_u128, field_u64},
};

/// Transactions of a block, in block order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// Requested without full objects.
    Hashes(Vec<String>),
    Full(Vec<TransactionRecord>),
}

impl BlockTransactions {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Hashes(hashes) => hashes.len(),
            Self::Full(txs) => txs.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BlockTransactions {
    fn default() -> Self {
        Self::Hashes(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    pub number: u64,
    /// `None` for a pending block.
    pub hash: Option<String>,
    pub parent_hash: String,
    pub timestamp: u64,
    /// Present on chains with a fee market.
    pub base_fee_per_gas: Option<u128>,
    pub transactions: BlockTransactions,
}

impl BlockRecord {
    /// Decodes an `eth_getBlockBy*` result.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidResponse`] for `null`, missing required
    /// fields, malformed quantities, or a transaction list mixing hashes and
    /// objects. A full transaction object that fails to decode is dropped
    /// instead.
    pub fn from_rpc(value: &Value) -> Result<Self, UpstreamError> {
        const RECORD: &str = "block";
        let block = expect_object(RECORD, value)?;
        let int = |field: &str| field_u64(block, field).map_err(|e| field_error(RECORD, field, &e));

        Ok(Self {
            number: int("number")?.ok_or_else(|| missing(RECORD, "number"))?,
            hash: field_str(block, "hash"),
            parent_hash: field_str(block, "parentHash").unwrap_or_default(),
            timestamp: int("timestamp")?.unwrap_or(0),
            base_fee_per_gas: field_u128(block, "baseFeePerGas")
                .map_err(|e| field_error(RECORD, "baseFeePerGas", &e))?,
            transactions: parse_transactions(block.get("transactions"))?,
        })
    }

    /// Returns `true` if the block carries a hash, i.e. it is not pending.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.hash.is_some()
    }
}

fn parse_transactions(value: Option<&Value>) -> Result<BlockTransactions, UpstreamError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(BlockTransactions::default()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(UpstreamError::InvalidResponse(format!(
                "block.transactions: expected array, got {other}"
            )))
        }
    };

    match items.first() {
        None => Ok(BlockTransactions::default()),
        Some(Value::String(_)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    UpstreamError::InvalidResponse("block.transactions: mixed entries".into())
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(BlockTransactions::Hashes),
        Some(_) => {
            if items.iter().any(Value::is_string) {
                return Err(UpstreamError::InvalidResponse(
                    "block.transactions: mixed entries".into(),
                ));
            }
            Ok(BlockTransactions::Full(items.iter().filter_map(parse_full_transaction).collect()))
        }
    }
}

/// A transaction object that does not decode is dropped; the block stays valid.
fn parse_full_transaction(item: &Value) -> Option<TransactionRecord> {
    match TransactionRecord::from_rpc(item) {
        Ok(tx) => Some(tx),
        Err(e) => {
            let hash = item.get("hash").and_then(Value::as_str).unwrap_or("<unknown>");
            debug!(tx_hash = hash, error = %e, "dropping undecodable transaction from block");
            None
        }
    }
}
