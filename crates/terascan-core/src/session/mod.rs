//! Per-operator session state
//!
//! A [`Session`] lives in memory only, keyed by operator id in the
//! [`SessionStore`]. Every transition returns a [`Cleanup`] value listing the
//! transient messages it leaves behind.

mod cleanup;
mod pagination;
mod store;

pub use cleanup::{Cleanup, CleanupScheduler, ScheduledDeletion};
pub use pagination::{render_page, PageView, PaginationController};
pub use store::SessionStore;

use crate::frontend::MessageRef;
use crate::history::Dialog;

/// One chat of the LIST snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    /// Chat id in the history client
    pub chat_id: i64,
    /// Name shown to the operator
    pub display_name: String,
    /// Unread count at LIST time
    pub unread_count: u32,
}

impl From<Dialog> for ChatSummary {
    fn from(dialog: Dialog) -> Self {
        Self {
            chat_id: dialog.id,
            display_name: dialog.display_name(),
            unread_count: dialog.unread_count,
        }
    }
}

/// Operator-visible state, derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No chats loaded
    Idle,
    /// Chats loaded, nothing selected
    Listing,
    /// A chat is selected for scanning
    Selected,
}

/// Interaction state of one operator.
///
/// `chats` is a snapshot taken at LIST time and is never refreshed during
/// pagination; only a new LIST replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Chat snapshot from the last LIST
    pub chats: Vec<ChatSummary>,
    /// Zero-based page index into `chats`
    pub page: usize,
    /// Chat picked for scanning
    pub selected_chat_id: Option<i64>,
    /// Session UI messages to delete once the session advances
    pub transient_messages: Vec<MessageRef>,
    /// The single pagination message currently shown
    pub page_message: Option<MessageRef>,
}

impl Session {
    /// Fresh LIST session on page zero
    #[must_use]
    pub fn listing(chats: Vec<ChatSummary>, transient_messages: Vec<MessageRef>) -> Self {
        Self {
            chats,
            transient_messages,
            ..Self::default()
        }
    }

    /// Current operator-visible state
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.selected_chat_id.is_some() {
            SessionState::Selected
        } else if self.chats.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Listing
        }
    }

    /// Number of pages for `page_size` chats per page; zero without chats
    #[must_use]
    pub fn page_count(&self, page_size: usize) -> usize {
        let page_size = if page_size == 0 { 1 } else { page_size };
        self.chats.len().div_ceil(page_size)
    }

    /// Keep `page` inside `[0, page_count - 1]`
    pub fn clamp_page(&mut self, page_size: usize) {
        let last = self.page_count(page_size).saturating_sub(1);
        self.page = self.page.min(last);
    }

    /// Remember a transient message
    pub fn track(&mut self, message: MessageRef) {
        if !self.transient_messages.contains(&message) {
            self.transient_messages.push(message);
        }
    }

    /// Forget a transient message (already deleted elsewhere)
    pub fn untrack(&mut self, message: MessageRef) {
        self.transient_messages.retain(|m| *m != message);
    }

    /// Move all transient messages into a cleanup set
    pub fn take_transient(&mut self) -> Cleanup {
        self.page_message = None;
        std::mem::take(&mut self.transient_messages)
            .into_iter()
            .collect()
    }

    /// Snapshot entry for a chat id
    #[must_use]
    pub fn chat(&self, chat_id: i64) -> Option<&ChatSummary> {
        self.chats.iter().find(|c| c.chat_id == chat_id)
    }
}
