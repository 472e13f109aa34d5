//! Unauthorized access flood protection
//!
//! Strangers writing to the bot get "Access denied" at most once per cooldown,
//! so a flood of messages cannot push the bot into Bot API rate limits.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Log one line per this many silenced attempts
const SILENCED_LOG_EVERY: u64 = 100;

/// Last "Access denied" reply per user, with a cooldown between replies.
///
/// Entries expire after the cache TTL, so users that stop writing are
/// forgotten even if the cooldown is longer.
#[derive(Clone)]
pub struct UnauthorizedCache {
    /// user id -> time of the last denial sent
    last_denied: Cache<i64, Instant>,
    cooldown: Duration,
    silenced_count: Arc<AtomicU64>,
}

impl UnauthorizedCache {
    /// Create a cache with the given cooldown, entry TTL and capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use terascan_transport_telegram::bot::UnauthorizedCache;
    ///
    /// let cache = UnauthorizedCache::new(1200, 7200, 10_000);
    /// assert_eq!(cache.cooldown().as_secs(), 1200);
    /// ```
    #[must_use]
    pub fn new(cooldown_secs: u64, ttl_secs: u64, max_capacity: u64) -> Self {
        let last_denied = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            last_denied,
            cooldown: Duration::from_secs(cooldown_secs),
            silenced_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Check if a denial should be sent to this user now.
    ///
    /// Attempts inside the cooldown are counted as silenced; only every
    /// hundredth of them is logged.
    pub async fn should_send(&self, user_id: i64, user_name: &str) -> bool {
        let Some(last) = self.last_denied.get(&user_id).await else {
            return true;
        };
        if last.elapsed() >= self.cooldown {
            return true;
        }

        let count = self.silenced_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(SILENCED_LOG_EVERY) {
            debug!(
                "⛔️ Silenced {} unauthorized attempts (recent: user {} - {})",
                count, user_id, user_name
            );
        }
        false
    }

    /// Record that a denial was delivered, starting the cooldown
    pub async fn mark_sent(&self, user_id: i64) {
        self.last_denied.insert(user_id, Instant::now()).await;
    }

    /// Number of users currently tracked
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.last_denied.entry_count()
    }

    /// Total attempts answered with silence
    #[must_use]
    pub fn silenced_count(&self) -> u64 {
        self.silenced_count.load(Ordering::Relaxed)
    }

    /// Minimum time between two denials to the same user
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_attempt_is_answered() {
        let cache = UnauthorizedCache::new(60, 120, 100);
        assert!(cache.should_send(12345, "Stranger").await);
    }

    #[tokio::test]
    async fn test_cooldown_silences_repeats_per_user() {
        let cache = UnauthorizedCache::new(60, 120, 100);
        cache.mark_sent(111).await;

        assert!(!cache.should_send(111, "Stranger").await);
        assert!(!cache.should_send(111, "Stranger").await);
        assert!(cache.should_send(222, "Other").await);
        assert_eq!(cache.silenced_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_cooldown_always_answers() {
        let cache = UnauthorizedCache::new(0, 120, 100);
        cache.mark_sent(111).await;
        assert!(cache.should_send(111, "Stranger").await);
        assert_eq!(cache.silenced_count(), 0);
    }

    #[tokio::test]
    async fn test_entry_count() {
        let cache = UnauthorizedCache::new(60, 120, 100);
        cache.mark_sent(111).await;
        cache.mark_sent(222).await;
        cache.last_denied.run_pending_tasks().await;

        assert_eq!(cache.entry_count(), 2);
    }
}
