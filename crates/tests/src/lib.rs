//! Integration tests for keel.
//!
//! All endpoints are mockito servers, so no network access is needed:
//!
//! - `fanout_tests`: first-valid selection in configured order
//! - `consensus_tests`: consensus height with timing-out and lagging endpoints
//! - `provider_tests`: longest-answer log queries, receipts and confirmations
//! - `ingest_tests`: ordered ingestion and checkpoint restarts
//! - `mock_infrastructure`: reusable mock nodes and fixtures
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod consensus_tests;

#[cfg(test)]
mod fanout_tests;

#[cfg(test)]
mod ingest_tests;

#[cfg(test)]
mod provider_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;
