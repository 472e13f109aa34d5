#![deny(missing_docs)]
//! Terascan bot binary support.
//!
//! Log redaction, history-account settings and the MTProto history client.

/// Tracing setup with secret redaction.
pub mod logging;
/// Settings of the history (user) account.
pub mod settings;

/// MTProto history client.
#[cfg(feature = "mtproto")]
pub mod history;
