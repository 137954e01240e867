//! # Keel Core
//!
//! Client-side library for reading an Ethereum-compatible chain through several
//! JSON-RPC endpoints at once.
//!
//! - **[`upstream`]**: endpoint transports, the fan-out executor and the
//!   height consensus with its monotonic ratchet.
//!
//! - **[`provider`]**: the [`provider::ChainProvider`] facade, backed either by a
//!   single endpoint or by the resilient multi-endpoint implementation.
//!
//! - **[`ingest`]**: sequential, checkpointed block ingestion with block and
//!   transaction listeners.
//!
//! - **[`chain`]**: normalized block, transaction, receipt and fee records.
//!
//! - **[`config`]**: layered configuration (defaults, TOML file, `KEEL__*`
//!   environment variables).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      BlockIngestor                       │
//! │   cursor ─► batch fetch ─► pending ─► checkpoint/emit    │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ ChainProvider
//! ┌────────────────────────────▼─────────────────────────────┐
//! │                    ResilientProvider                     │
//! │  ┌──────────────────┐         ┌───────────────────────┐  │
//! │  │  HeightConsensus │         │    FanOutExecutor     │  │
//! │  │  median + window │◄────────┤ first-valid / longest │  │
//! │  │  ratchet         │         └───────────┬───────────┘  │
//! │  └──────────────────┘                     │              │
//! └───────────────────────────────────────────┼──────────────┘
//!                          ┌──────────────────┼──────────────────┐
//!                          ▼                  ▼                  ▼
//!                    UpstreamEndpoint   UpstreamEndpoint   UpstreamEndpoint
//! ```

pub mod chain;
pub mod config;
pub mod ingest;
pub mod provider;
pub mod types;
pub mod upstream;
pub mod utils;
