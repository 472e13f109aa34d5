use crate::config::DEFAULT_BOUNDED_SCAN_LIMIT;

/// How the scanned message window was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Exactly the unread backlog
    Unread,
    /// A fixed window of recent history
    Bounded,
}

/// Outcome of [`ScanPolicy::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPlan {
    /// Number of most recent messages to scan; always positive
    pub limit: usize,
    /// Why this limit was picked
    pub mode: ScanMode,
}

/// Decides how many messages a scan reads.
///
/// With an unread backlog the scan covers exactly the unread messages,
/// otherwise the most recent `bounded_limit` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    bounded_limit: usize,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDED_SCAN_LIMIT)
    }
}

impl ScanPolicy {
    /// Policy with a custom bounded window (at least one message)
    #[must_use]
    pub const fn new(bounded_limit: usize) -> Self {
        Self {
            bounded_limit: if bounded_limit == 0 { 1 } else { bounded_limit },
        }
    }

    /// Size of the bounded window
    #[must_use]
    pub const fn bounded_limit(&self) -> usize {
        self.bounded_limit
    }

    /// Pick the scan window for a chat with `unread_count` unread messages
    ///
    /// # Examples
    ///
    /// ```
    /// use terascan_core::scan::{ScanMode, ScanPolicy};
    ///
    /// let plan = ScanPolicy::default().decide(7);
    /// assert_eq!((plan.limit, plan.mode), (7, ScanMode::Unread));
    /// ```
    #[must_use]
    pub const fn decide(&self, unread_count: u32) -> ScanPlan {
        if unread_count > 0 {
            ScanPlan {
                limit: unread_count as usize,
                mode: ScanMode::Unread,
            }
        } else {
            ScanPlan {
                limit: self.bounded_limit,
                mode: ScanMode::Bounded,
            }
        }
    }
}
