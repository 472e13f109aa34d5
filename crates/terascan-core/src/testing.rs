//! In-memory collaborators for tests

use crate::frontend::{DeliveryError, FrontEnd, Keyboard, MessageRef};
use crate::history::{ChatEntity, Dialog, HistoryClient, HistoryError, HistoryMessage, MessageStream};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A message delivered through [`RecordingFrontEnd`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Address assigned on delivery
    pub message: MessageRef,
    /// Text as sent
    pub text: String,
    /// Keyboard as sent
    pub keyboard: Keyboard,
}

#[derive(Default)]
struct Recorded {
    next_id: i32,
    sent: Vec<SentMessage>,
    edits: Vec<(MessageRef, String)>,
    deleted: Vec<MessageRef>,
}

/// Front end that records every call and hands out sequential message ids
#[derive(Default)]
pub struct RecordingFrontEnd {
    recorded: Mutex<Recorded>,
    fail_sends: bool,
    fail_edits: bool,
    fail_deletes: bool,
}

impl RecordingFrontEnd {
    /// Front end where every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Every edit fails
    pub fn failing_edits(mut self) -> Self {
        self.fail_edits = true;
        self
    }

    /// Every deletion fails
    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().expect("recording lock poisoned")
    }

    /// All delivered messages in order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.recorded().sent.clone()
    }

    /// Texts of all delivered messages in order
    pub fn texts(&self) -> Vec<String> {
        self.recorded().sent.iter().map(|m| m.text.clone()).collect()
    }

    /// Successful edits in order
    pub fn edits(&self) -> Vec<(MessageRef, String)> {
        self.recorded().edits.clone()
    }

    /// Successfully deleted messages in order
    pub fn deleted(&self) -> Vec<MessageRef> {
        self.recorded().deleted.clone()
    }

    /// Delivered messages with this text that were not deleted
    pub fn live_with_text(&self, text: &str) -> Vec<SentMessage> {
        let recorded = self.recorded();
        recorded
            .sent
            .iter()
            .filter(|m| m.text == text && !recorded.deleted.contains(&m.message))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FrontEnd for RecordingFrontEnd {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<MessageRef, DeliveryError> {
        if self.fail_sends {
            return Err(DeliveryError::Send("bot was blocked by the user".into()));
        }
        let mut recorded = self.recorded();
        recorded.next_id += 1;
        let message = MessageRef::new(chat_id, recorded.next_id);
        recorded.sent.push(SentMessage {
            message,
            text: text.to_string(),
            keyboard,
        });
        Ok(message)
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        if self.fail_edits {
            return Err(DeliveryError::Edit("message can't be edited".into()));
        }
        self.recorded().edits.push((message, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), DeliveryError> {
        if self.fail_deletes {
            return Err(DeliveryError::Delete("message to delete not found".into()));
        }
        self.recorded().deleted.push(message);
        Ok(())
    }
}

/// Scripted history client
#[derive(Default)]
pub struct FakeHistory {
    dialogs: Vec<Dialog>,
    messages: HashMap<i64, Vec<HistoryMessage>>,
    unreachable: HashSet<i64>,
    failing_iteration: HashSet<i64>,
    stalled: HashSet<i64>,
    fail_listing: bool,
    fail_mark_read: bool,
    marks: Mutex<Vec<(i64, Option<i32>)>>,
    iterations: Mutex<Vec<(i64, usize)>>,
}

impl FakeHistory {
    /// Client without dialogs
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dialog
    pub fn with_dialog(mut self, id: i64, name: &str, unread_count: u32) -> Self {
        self.dialogs.push(Dialog::new(id, name, unread_count));
        self
    }

    /// History of a chat, newest first
    pub fn with_messages(mut self, chat_id: i64, messages: Vec<HistoryMessage>) -> Self {
        self.messages.insert(chat_id, messages);
        self
    }

    /// Entity resolution fails for this chat
    pub fn unreachable(mut self, chat_id: i64) -> Self {
        self.unreachable.insert(chat_id);
        self
    }

    /// The message stream of this chat ends with an error
    pub fn failing_iteration(mut self, chat_id: i64) -> Self {
        self.failing_iteration.insert(chat_id);
        self
    }

    /// The message stream of this chat never yields
    pub fn stalled(mut self, chat_id: i64) -> Self {
        self.stalled.insert(chat_id);
        self
    }

    /// Listing dialogs fails
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Marking read fails
    pub fn failing_mark_read(mut self) -> Self {
        self.fail_mark_read = true;
        self
    }

    /// Recorded mark-read calls, including failed ones
    pub fn marks(&self) -> Vec<(i64, Option<i32>)> {
        self.marks.lock().expect("marks lock poisoned").clone()
    }

    /// Recorded `(chat_id, limit)` iteration requests
    pub fn iterations(&self) -> Vec<(i64, usize)> {
        self.iterations
            .lock()
            .expect("iterations lock poisoned")
            .clone()
    }
}

#[async_trait]
impl HistoryClient for FakeHistory {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>, HistoryError> {
        if self.fail_listing {
            return Err(HistoryError::Other("FLOOD_WAIT_X".into()));
        }
        Ok(self.dialogs.clone())
    }

    fn iter_messages(&self, chat_id: i64, limit: usize) -> MessageStream {
        self.iterations
            .lock()
            .expect("iterations lock poisoned")
            .push((chat_id, limit));

        if self.stalled.contains(&chat_id) {
            return stream::pending().boxed();
        }

        let mut items: Vec<Result<HistoryMessage, HistoryError>> = self
            .messages
            .get(&chat_id)
            .map(|messages| messages.iter().take(limit).cloned().map(Ok).collect())
            .unwrap_or_default();
        if self.failing_iteration.contains(&chat_id) {
            items.push(Err(HistoryError::Iteration("connection reset".into())));
        }
        stream::iter(items).boxed()
    }

    async fn mark_read(&self, chat_id: i64, up_to: Option<i32>) -> Result<(), HistoryError> {
        self.marks
            .lock()
            .expect("marks lock poisoned")
            .push((chat_id, up_to));
        if self.fail_mark_read {
            return Err(HistoryError::Other("CHANNEL_PRIVATE".into()));
        }
        Ok(())
    }

    async fn resolve_entity(&self, chat_id: i64) -> Result<ChatEntity, HistoryError> {
        if self.unreachable.contains(&chat_id) {
            return Err(HistoryError::Unreachable {
                chat_id,
                reason: "CHANNEL_PRIVATE".into(),
            });
        }
        let display_name = self
            .dialogs
            .iter()
            .find(|d| d.id == chat_id)
            .map_or_else(|| chat_id.to_string(), Dialog::display_name);
        Ok(ChatEntity {
            id: chat_id,
            display_name,
        })
    }
}
