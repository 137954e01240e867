use serde::Serialize;
use serde_json::Value;

use super::{expect_object, field_error, missing};
use crate::{
    upstream::UpstreamError,
    utils::quantity::{field_str, field_u128, field_u64},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub block_hash: Option<String>,
    /// `1` success, `0` reverted. Pre-Byzantium receipts carry no status.
    pub status: Option<u64>,
    pub gas_used: u128,
    pub contract_address: Option<String>,
    /// Raw log objects, undecoded.
    pub logs: Vec<Value>,
}

impl Receipt {
    /// Decodes an `eth_getTransactionReceipt` result.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidResponse`] for `null` (transaction not yet
    /// mined), a missing transaction hash, or malformed quantities.
    pub fn from_rpc(value: &Value) -> Result<Self, UpstreamError> {
        const RECORD: &str = "receipt";
        let receipt = expect_object(RECORD, value)?;
        let int = |field: &str| field_u64(receipt, field).map_err(|e| field_error(RECORD, field, &e));

        Ok(Self {
            transaction_hash: field_str(receipt, "transactionHash")
                .ok_or_else(|| missing(RECORD, "transactionHash"))?,
            block_number: int("blockNumber")?,
            block_hash: field_str(receipt, "blockHash"),
            status: int("status")?,
            gas_used: field_u128(receipt, "gasUsed")
                .map_err(|e| field_error(RECORD, "gasUsed", &e))?
                .unwrap_or(0),
            contract_address: field_str(receipt, "contractAddress"),
            logs: receipt.get("logs").and_then(Value::as_array).cloned().unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == Some(1)
    }

    /// Number of blocks that include the receipt's block as of `tip`, counting
    /// the block itself. Zero if the receipt is not in a block at or below `tip`.
    #[must_use]
    pub fn confirmations(&self, tip: u64) -> u64 {
        match self.block_number {
            Some(number) if number <= tip => tip - number + 1,
            _ => 0,
        }
    }
}
