use serde::Serialize;

/// Priority fee used when the node does not answer `eth_maxPriorityFeePerGas`.
pub const DEFAULT_PRIORITY_FEE: u128 = 1_500_000_000;

/// Current fee suggestion.
///
/// The EIP-1559 fields are `None` on chains whose latest block has no base fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FeeData {
    pub gas_price: Option<u128>,
    pub last_base_fee: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl FeeData {
    /// Derives the fee suggestion from the node's gas price, the latest base
    /// fee, and the node's priority fee suggestion.
    ///
    /// `max_fee_per_gas` is `2 * base_fee + priority`, which stays valid for
    /// several blocks of maximal base fee growth.
    #[must_use]
    pub fn from_parts(
        gas_price: Option<u128>,
        base_fee: Option<u128>,
        priority_fee: Option<u128>,
    ) -> Self {
        match base_fee {
            Some(base_fee) => {
                let priority = priority_fee.unwrap_or(DEFAULT_PRIORITY_FEE);
                Self {
                    gas_price,
                    last_base_fee: Some(base_fee),
                    max_fee_per_gas: Some(base_fee.saturating_mul(2).saturating_add(priority)),
                    max_priority_fee_per_gas: Some(priority),
                }
            }
            None => Self { gas_price, ..Self::default() },
        }
    }
}
