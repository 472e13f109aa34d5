//! Settings of the automation account that reads chat history.

use config::{Config, ConfigError};
use serde::Deserialize;
use std::fmt;

/// Default session file of the automation account
pub const DEFAULT_SESSION_FILE: &str = "user_session";

/// MTProto credentials and session location.
///
/// Loaded from `API_ID`, `API_HASH` and `SESSION_FILE` (or the config files).
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    /// Application id from my.telegram.org
    pub api_id: i32,
    /// Application hash from my.telegram.org
    pub api_hash: String,
    /// Path of the authorized session file
    #[serde(default = "default_session_file")]
    pub session_file: String,
}

fn default_session_file() -> String {
    DEFAULT_SESSION_FILE.to_string()
}

impl HistorySettings {
    /// Load settings from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a credential is missing.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(terascan_core::config::build_config()?)
    }

    /// Deserialize from an already built configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a credential is missing or malformed.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        if settings.api_hash.trim().is_empty() {
            return Err(ConfigError::Message("api_hash must not be empty".into()));
        }
        Ok(settings)
    }
}

impl fmt::Debug for HistorySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistorySettings")
            .field("api_id", &self.api_id)
            .field("api_hash", &"[MASKED]")
            .field("session_file", &self.session_file)
            .finish()
    }
}
