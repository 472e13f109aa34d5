#![deny(missing_docs)]
//! Terascan core library.
//!
//! Transport-agnostic scan workflow: session state machine, pagination,
//! link extraction and delivery of scan results.

/// Configuration management.
pub mod config;
/// Front-end transport interface (outbound messages, keyboards, callbacks).
pub mod frontend;
/// Chat-history client interface.
pub mod history;
/// Top-level interaction state machine.
pub mod router;
/// Link extraction, batching, scan policy and the scan pipeline.
pub mod scan;
/// Per-operator session state, pagination and cleanup scheduling.
pub mod session;
/// Utility functions.
pub mod utils;
/// Operator-facing texts.
pub mod views;

/// In-memory collaborators for unit tests.
#[cfg(test)]
pub mod testing;
