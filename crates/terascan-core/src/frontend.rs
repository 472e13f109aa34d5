//! Front-end transport interface
//!
//! Describes what the scan workflow sends to the operator: texts with one of
//! the fixed keyboard layouts, edits and deletions, plus the callback payloads
//! of inline buttons.

use async_trait::async_trait;
use thiserror::Error;

/// Callback payload of the "next page" button
pub const CALLBACK_NEXT: &str = "NEXT";
/// Callback payload of the "previous page" button
pub const CALLBACK_PREV: &str = "PREV";
/// Callback payload prefix of a chat row
pub const CALLBACK_SELECT_PREFIX: &str = "SELECT:";
/// Short select prefix accepted from older keyboards
const CALLBACK_SELECT_SHORT_PREFIX: &str = "SEL:";

/// Labels of the home reply keyboard
pub const HOME_KEYBOARD_LABELS: [&str; 2] = ["START", "LIST"];
/// Labels of the scan-confirm reply keyboard
pub const SCAN_KEYBOARD_LABELS: [&str; 2] = ["SCAN", "CANCEL"];

/// Address of a delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    /// Chat the message lives in
    pub chat_id: i64,
    /// Message id inside that chat
    pub message_id: i32,
}

impl MessageRef {
    /// Create a message reference
    #[must_use]
    pub const fn new(chat_id: i64, message_id: i32) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// Action encoded in an inline button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Show the next page of chats
    Next,
    /// Show the previous page of chats
    Prev,
    /// Select the chat with this id
    Select(i64),
}

impl ButtonAction {
    /// Encode as callback data
    #[must_use]
    pub fn callback_data(&self) -> String {
        match self {
            Self::Next => CALLBACK_NEXT.to_string(),
            Self::Prev => CALLBACK_PREV.to_string(),
            Self::Select(chat_id) => format!("{CALLBACK_SELECT_PREFIX}{chat_id}"),
        }
    }

    /// Decode callback data; unknown payloads yield `None`
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            CALLBACK_NEXT => Some(Self::Next),
            CALLBACK_PREV => Some(Self::Prev),
            _ => data
                .strip_prefix(CALLBACK_SELECT_PREFIX)
                .or_else(|| data.strip_prefix(CALLBACK_SELECT_SHORT_PREFIX))
                .and_then(|id| id.trim().parse().ok())
                .map(Self::Select),
        }
    }
}

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    /// Visible label
    pub label: String,
    /// Action sent back when pressed
    pub action: ButtonAction,
}

impl InlineButton {
    /// Create an inline button
    #[must_use]
    pub fn new(label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Keyboard attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Reply keyboard `[START, LIST]`
    Home,
    /// Reply keyboard `[SCAN, CANCEL]`
    ScanConfirm,
    /// Remove the current reply keyboard
    Hide,
    /// Inline rows of buttons
    Inline(Vec<Vec<InlineButton>>),
    /// Plain text, keyboard left as is
    None,
}

impl Keyboard {
    /// Labels of the reply keyboard layouts, `None` for the others
    #[must_use]
    pub const fn reply_labels(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Home => Some(&HOME_KEYBOARD_LABELS),
            Self::ScanConfirm => Some(&SCAN_KEYBOARD_LABELS),
            Self::Hide | Self::Inline(_) | Self::None => None,
        }
    }
}

/// Delivery failures; never fatal to the workflow
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Sending a message failed
    #[error("send failed: {0}")]
    Send(String),
    /// Editing a message failed
    #[error("edit failed: {0}")]
    Edit(String),
    /// Deleting a message failed
    #[error("delete failed: {0}")]
    Delete(String),
}

/// Interface of the operator-facing transport
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrontEnd: Send + Sync {
    /// Send a text with a keyboard layout, returning the new message address
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<MessageRef, DeliveryError>;

    /// Replace the text of a message and drop its inline keyboard
    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError>;

    /// Delete a message
    async fn delete_message(&self, message: MessageRef) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_data_encoding() {
        assert_eq!(ButtonAction::Next.callback_data(), "NEXT");
        assert_eq!(ButtonAction::Prev.callback_data(), "PREV");
        assert_eq!(
            ButtonAction::Select(-1_001_234).callback_data(),
            "SELECT:-1001234"
        );
    }

    #[test]
    fn test_callback_data_parsing() {
        assert_eq!(ButtonAction::parse("NEXT"), Some(ButtonAction::Next));
        assert_eq!(ButtonAction::parse("PREV"), Some(ButtonAction::Prev));
        assert_eq!(
            ButtonAction::parse("SELECT:777"),
            Some(ButtonAction::Select(777))
        );
        assert_eq!(
            ButtonAction::parse("SEL:-5"),
            Some(ButtonAction::Select(-5))
        );
    }

    #[test]
    fn test_callback_data_rejects_garbage() {
        assert_eq!(ButtonAction::parse("next"), None);
        assert_eq!(ButtonAction::parse("SELECT:abc"), None);
        assert_eq!(ButtonAction::parse(""), None);
    }

    #[test]
    fn test_reply_labels() {
        assert_eq!(Keyboard::Home.reply_labels(), Some(&["START", "LIST"][..]));
        assert_eq!(
            Keyboard::ScanConfirm.reply_labels(),
            Some(&["SCAN", "CANCEL"][..])
        );
        assert_eq!(Keyboard::Hide.reply_labels(), None);
    }
}
