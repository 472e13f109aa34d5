use crate::frontend::{FrontEnd, MessageRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Transient messages left behind by a transition, in order.
///
/// Returned by every handler instead of being collected in a side list, so
/// the deletion set of a transition can be inspected directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cleanup {
    messages: Vec<MessageRef>,
}

impl Cleanup {
    /// Empty cleanup set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Add a message; duplicates are ignored
    pub fn push(&mut self, message: MessageRef) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    /// Append all messages of another cleanup set
    pub fn merge(&mut self, other: Self) {
        self.extend(other.messages);
    }

    /// Messages to delete, in insertion order
    #[must_use]
    pub fn messages(&self) -> &[MessageRef] {
        &self.messages
    }

    /// Check if a message is part of the set
    #[must_use]
    pub fn contains(&self, message: &MessageRef) -> bool {
        self.messages.contains(message)
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if nothing needs deleting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Extend<MessageRef> for Cleanup {
    fn extend<T: IntoIterator<Item = MessageRef>>(&mut self, iter: T) {
        for message in iter {
            self.push(message);
        }
    }
}

impl FromIterator<MessageRef> for Cleanup {
    fn from_iter<T: IntoIterator<Item = MessageRef>>(iter: T) -> Self {
        let mut cleanup = Self::new();
        cleanup.extend(iter);
        cleanup
    }
}

impl IntoIterator for Cleanup {
    type Item = MessageRef;
    type IntoIter = std::vec::IntoIter<MessageRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

/// A pending delayed deletion.
///
/// Dropping the handle does not cancel the deletion; call [`cancel`](Self::cancel).
pub struct ScheduledDeletion {
    message: MessageRef,
    token: CancellationToken,
    handle: JoinHandle<bool>,
}

impl ScheduledDeletion {
    /// Message this deletion targets
    #[must_use]
    pub const fn message(&self) -> MessageRef {
        self.message
    }

    /// Abort the deletion if it has not run yet
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if the deletion task has finished
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task; `true` if the message was deleted
    pub async fn join(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

/// Fire-and-forget deletion of transient messages after a fixed delay.
///
/// Deletion failures (already deleted, missing permission) are logged at
/// debug level and never reach the caller.
#[derive(Clone)]
pub struct CleanupScheduler {
    frontend: Arc<dyn FrontEnd>,
    delay: Duration,
}

impl CleanupScheduler {
    /// Create a scheduler deleting through `frontend` after `delay`
    #[must_use]
    pub fn new(frontend: Arc<dyn FrontEnd>, delay: Duration) -> Self {
        Self { frontend, delay }
    }

    /// Spawn one delayed deletion per message of `cleanup`
    pub fn schedule(&self, cleanup: Cleanup) -> Vec<ScheduledDeletion> {
        cleanup
            .into_iter()
            .map(|message| self.schedule_one(message))
            .collect()
    }

    fn schedule_one(&self, message: MessageRef) -> ScheduledDeletion {
        let token = CancellationToken::new();
        let frontend = self.frontend.clone();
        let delay = self.delay;
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => {
                    debug!(message_id = message.message_id, "Scheduled deletion cancelled");
                    false
                }
                () = tokio::time::sleep(delay) => delete_best_effort(frontend.as_ref(), message).await,
            }
        });

        ScheduledDeletion {
            message,
            token,
            handle,
        }
    }

    /// Delete a message right away, best effort
    pub async fn delete_now(&self, message: MessageRef) -> bool {
        delete_best_effort(self.frontend.as_ref(), message).await
    }
}

/// Delete a message, swallowing failures
pub(crate) async fn delete_best_effort(frontend: &dyn FrontEnd, message: MessageRef) -> bool {
    match frontend.delete_message(message).await {
        Ok(()) => true,
        Err(e) => {
            debug!(
                chat_id = message.chat_id,
                message_id = message.message_id,
                "Message deletion skipped: {e}"
            );
            false
        }
    }
}
