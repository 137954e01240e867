//! # Consensus Height Overview
//!
//! Public nodes disagree about the chain tip: some lag a few blocks behind,
//! some are stuck, a few report heights that are simply wrong. The consensus
//! selector turns the heights reported by every endpoint into one trusted
//! height that never moves backwards.
//!
//! ## Algorithm Steps
//!
//! 1. **Parallel Query**: `eth_blockNumber` is fanned out with the `Height` timeout
//! 2. **Median**: Successful observations are sorted; the lower median is taken
//! 3. **Window**: Observations within `±window` of the median are kept
//! 4. **Selection**: The highest kept observation wins (full set if none kept)
//! 5. **Ratchet**: The result is `max(selected, previous)`, stored atomically
//!
//! # Module Organization
//!
//! - [`quorum`]: Stateless window selection over raw observations
//! - [`engine`]: `HeightConsensus`, the fan-out query plus the monotonic ratchet

pub mod engine;
pub mod quorum;

pub use engine::HeightConsensus;
pub use quorum::select_height;
