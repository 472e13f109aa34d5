//! Configuration and settings management
//!
//! Loads scan settings from config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chats shown per pagination page.
pub const DEFAULT_PAGE_SIZE: usize = 30;
/// Maximum characters of a chat button label.
pub const DEFAULT_LABEL_MAX_CHARS: usize = 60;
/// Messages scanned when a chat has no unread backlog.
pub const DEFAULT_BOUNDED_SCAN_LIMIT: usize = 1000;
/// Maximum characters in one delivered link batch (Telegram message limit).
pub const DEFAULT_MESSAGE_CHUNK_LIMIT: usize = 4096;
/// Delay before a transient message is deleted.
pub const DEFAULT_CLEANUP_DELAY_MS: u64 = 1000;
/// Pause between consecutive link batches.
pub const DEFAULT_SEND_DELAY_MS: u64 = 100;
/// Upper bound for one chat-history iteration.
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 600;

/// Max retry attempts for front-end API operations
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff in milliseconds
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Backoff ceiling in milliseconds
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;

/// Build the layered configuration shared by all crates.
///
/// Sources, later ones overriding earlier ones: `config/default`,
/// `config/{RUN_MODE}`, `config/local`, `APP__*` variables and plain
/// environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a source cannot be read or parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE variables map to snake_case keys; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Settings of the scan workflow
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// Chats per pagination page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Maximum characters of a chat button label
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,
    /// Messages scanned when there is no unread backlog
    #[serde(default = "default_bounded_scan_limit")]
    pub bounded_scan_limit: usize,
    /// Maximum characters of one link batch
    #[serde(default = "default_message_chunk_limit")]
    pub message_chunk_limit: usize,
    /// Delay before transient messages are deleted, in milliseconds
    #[serde(default = "default_cleanup_delay_ms")]
    pub cleanup_delay_ms: u64,
    /// Pause between link batches, in milliseconds
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
    /// Timeout of one history iteration, in seconds
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

const fn default_label_max_chars() -> usize {
    DEFAULT_LABEL_MAX_CHARS
}

const fn default_bounded_scan_limit() -> usize {
    DEFAULT_BOUNDED_SCAN_LIMIT
}

const fn default_message_chunk_limit() -> usize {
    DEFAULT_MESSAGE_CHUNK_LIMIT
}

const fn default_cleanup_delay_ms() -> u64 {
    DEFAULT_CLEANUP_DELAY_MS
}

const fn default_send_delay_ms() -> u64 {
    DEFAULT_SEND_DELAY_MS
}

const fn default_scan_timeout_secs() -> u64 {
    DEFAULT_SCAN_TIMEOUT_SECS
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            label_max_chars: DEFAULT_LABEL_MAX_CHARS,
            bounded_scan_limit: DEFAULT_BOUNDED_SCAN_LIMIT,
            message_chunk_limit: DEFAULT_MESSAGE_CHUNK_LIMIT,
            cleanup_delay_ms: DEFAULT_CLEANUP_DELAY_MS,
            send_delay_ms: DEFAULT_SEND_DELAY_MS,
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
        }
    }
}

impl ScanSettings {
    /// Load settings from config files and the environment.
    ///
    /// Zero values for sizes and limits are replaced by their defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        Ok(settings.normalized())
    }

    /// Replace zero sizes with defaults; a zero page size or limit has no meaning.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.label_max_chars == 0 {
            self.label_max_chars = DEFAULT_LABEL_MAX_CHARS;
        }
        if self.bounded_scan_limit == 0 {
            self.bounded_scan_limit = DEFAULT_BOUNDED_SCAN_LIMIT;
        }
        if self.message_chunk_limit == 0 {
            self.message_chunk_limit = DEFAULT_MESSAGE_CHUNK_LIMIT;
        }
        self
    }

    /// Delay before transient messages are deleted
    #[must_use]
    pub const fn cleanup_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_delay_ms)
    }

    /// Pause between link batches
    #[must_use]
    pub const fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    /// Timeout of one history iteration
    #[must_use]
    pub const fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_constants() {
        let settings = ScanSettings::default();
        assert_eq!(settings.page_size, 30);
        assert_eq!(settings.bounded_scan_limit, 1000);
        assert_eq!(settings.message_chunk_limit, 4096);
        assert_eq!(settings.cleanup_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_normalized_replaces_zero_values() {
        let settings = ScanSettings {
            page_size: 0,
            label_max_chars: 0,
            bounded_scan_limit: 0,
            message_chunk_limit: 0,
            ..ScanSettings::default()
        }
        .normalized();

        assert_eq!(settings, ScanSettings::default());
    }

    #[test]
    fn test_normalized_keeps_explicit_values() {
        let settings = ScanSettings {
            page_size: 5,
            bounded_scan_limit: 200,
            ..ScanSettings::default()
        }
        .normalized();

        assert_eq!(settings.page_size, 5);
        assert_eq!(settings.bounded_scan_limit, 200);
    }
}
