//! Chat-history client interface
//!
//! The automation account that reads chat history is an external collaborator.
//! The scan workflow only depends on [`HistoryClient`]; the MTProto binding
//! lives in the binary crate.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a history client
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The chat could not be resolved or accessed
    #[error("chat {chat_id} is unreachable: {reason}")]
    Unreachable {
        /// Requested chat id
        chat_id: i64,
        /// Reason reported by the client
        reason: String,
    },
    /// The message stream failed mid-iteration
    #[error("history iteration failed: {0}")]
    Iteration(String),
    /// The message stream did not finish in time
    #[error("history iteration timed out after {0:?}")]
    Timeout(Duration),
    /// Any other client failure (listing dialogs, marking read, ...)
    #[error("history client error: {0}")]
    Other(String),
}

/// A chat thread as reported by the history client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    /// Chat id
    pub id: i64,
    /// Display name, may be empty
    pub name: String,
    /// Number of unread messages
    pub unread_count: u32,
}

impl Dialog {
    /// Create a dialog entry
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>, unread_count: u32) -> Self {
        Self {
            id,
            name: name.into(),
            unread_count,
        }
    }

    /// Name to show to the operator; falls back to the id for nameless chats
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// A resolved chat entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntity {
    /// Chat id
    pub id: i64,
    /// Title or username of the chat
    pub display_name: String,
}

/// One message yielded by the history iterator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryMessage {
    /// Message id inside its chat
    pub id: i32,
    /// Visible message text
    pub text: Option<String>,
    /// Caption attached to media, if the client reports it separately
    pub media_caption: Option<String>,
    /// URL of the web page preview
    pub preview_url: Option<String>,
    /// Targets of hyperlinked text, in entity order
    pub hidden_urls: Vec<String>,
}

impl HistoryMessage {
    /// Text-only message
    #[must_use]
    pub fn text(id: i32, text: impl Into<String>) -> Self {
        Self {
            id,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Text, caption, preview URL and hyperlink targets joined by newlines.
    ///
    /// Returns `None` when the message carries none of them.
    #[must_use]
    pub fn searchable_text(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.text, &self.media_caption, &self.preview_url]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .chain(self.hidden_urls.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

/// Stream of history messages, most recent first
pub type MessageStream = BoxStream<'static, Result<HistoryMessage, HistoryError>>;

/// Interface of the chat-history collaborator.
///
/// Implementations are expected to be already authorized.
#[async_trait]
pub trait HistoryClient: Send + Sync {
    /// List all dialogs with their unread counters
    async fn list_dialogs(&self) -> Result<Vec<Dialog>, HistoryError>;

    /// Stream up to `limit` most recent messages of a chat
    fn iter_messages(&self, chat_id: i64, limit: usize) -> MessageStream;

    /// Mark a chat read up to `up_to` (inclusive), or entirely when `None`
    async fn mark_read(&self, chat_id: i64, up_to: Option<i32>) -> Result<(), HistoryError>;

    /// Resolve a chat id into an entity with a display name
    async fn resolve_entity(&self, chat_id: i64) -> Result<ChatEntity, HistoryError>;
}
