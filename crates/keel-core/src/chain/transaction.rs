use serde::Serialize;
use serde_json::Value;

use super::{expect_object, field_error, missing};
use crate::{
    upstream::UpstreamError,
    utils::quantity::{field_str, field_u128, field_u64},
};

/// The two gas pricing schemes a transaction can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GasPricing {
    Legacy { gas_price: u128 },
    Eip1559 { max_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    /// `None` for contract creation.
    pub to: Option<String>,
    pub nonce: u64,
    /// Wei.
    pub value: u128,
    pub gas_pricing: GasPricing,
    pub chain_id: Option<u64>,
    /// Set once mined.
    pub block_number: Option<u64>,
    pub transaction_index: Option<u64>,
}

impl TransactionRecord {
    /// Decodes a transaction object as returned by `eth_getTransactionByHash`
    /// or embedded in a full block.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidResponse`] for `null`, missing required
    /// fields, or malformed quantities.
    pub fn from_rpc(value: &Value) -> Result<Self, UpstreamError> {
        const RECORD: &str = "transaction";
        let tx = expect_object(RECORD, value)?;
        let quantity = |field: &str| field_u128(tx, field).map_err(|e| field_error(RECORD, field, &e));

        let max_fee = quantity("maxFeePerGas")?;
        let gas_pricing = match max_fee {
            Some(max_fee_per_gas) => GasPricing::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas: quantity("maxPriorityFeePerGas")?.unwrap_or(0),
            },
            None => GasPricing::Legacy {
                gas_price: quantity("gasPrice")?.ok_or_else(|| missing(RECORD, "gasPrice"))?,
            },
        };

        let int = |field: &str| field_u64(tx, field).map_err(|e| field_error(RECORD, field, &e));

        Ok(Self {
            hash: field_str(tx, "hash").ok_or_else(|| missing(RECORD, "hash"))?,
            from: field_str(tx, "from").ok_or_else(|| missing(RECORD, "from"))?,
            to: field_str(tx, "to"),
            nonce: int("nonce")?.ok_or_else(|| missing(RECORD, "nonce"))?,
            value: quantity("value")?.unwrap_or(0),
            gas_pricing,
            chain_id: int("chainId")?,
            block_number: int("blockNumber")?,
            transaction_index: int("transactionIndex")?,
        })
    }

    /// Returns `true` once the transaction is included in a block.
    #[must_use]
    pub fn is_mined(&self) -> bool {
        self.block_number.is_some()
    }
}
