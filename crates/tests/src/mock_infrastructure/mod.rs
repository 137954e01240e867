//! Mock nodes and fixtures for the integration tests.
//!
//! - `RpcMockBuilder`: mockito-backed JSON-RPC node
//! - `SilentNode`: accepts connections and never answers
//! - fixtures for blocks, transactions and logs, plus provider wiring
//!
//! ```ignore
//! use tests::mock_infrastructure::{create_test_block, provider_for, RpcMockBuilder};
//!
//! let mut node = RpcMockBuilder::new().await;
//! node.mock_block_number(100).mock_get_block_by_number(100, &create_test_block(100, 2));
//! let provider = provider_for(&[node.url()], fast_rpc_config());
//! ```

pub mod rpc_mock;
pub mod test_helpers;

pub use rpc_mock::{RpcMockBuilder, SilentNode};
pub use test_helpers::*;
