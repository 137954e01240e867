//! Small helpers shared across modules.
//!
//! ## Quantities (`quantity`)
//! - Hex/decimal decoding of JSON-RPC integers into `u64`/`u128`
//! - Optional field readers used by the record normalizers
//!
//! ## Block Parameters (`block_param`)
//! - Block references by number, tag or hash
//! - Parameter encoding and `eth_getBlockBy*` method selection

pub mod block_param;
pub mod quantity;

pub use block_param::{BlockId, BlockTag, ParseError as BlockParseError};
pub use quantity::{format_hex_u64, parse_u128, parse_u64, QuantityError};
