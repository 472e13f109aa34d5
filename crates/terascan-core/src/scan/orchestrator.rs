use super::{chunk_links, extract_links, ScanPlan, ScanPolicy};
use crate::config::ScanSettings;
use crate::frontend::{FrontEnd, Keyboard, MessageRef};
use crate::history::{ChatEntity, HistoryClient, HistoryError};
use crate::session::{Cleanup, Session};
use crate::views::{DefaultScanView, ScanView};
use futures_util::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures of one scan; all of them are reported to the operator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// SCAN was requested without a selected chat
    #[error("no chat selected")]
    NoChatSelected,
    /// The selected chat could not be resolved
    #[error("chat unreachable: {0}")]
    ChatUnreachable(String),
    /// Reading the chat history failed or timed out
    #[error("history iteration failed: {0}")]
    HistoryIteration(String),
}

/// Result of a finished scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// The scanned chat
    pub chat: ChatEntity,
    /// Window the scan covered
    pub plan: ScanPlan,
    /// Unread count the plan was based on
    pub unread_count: u32,
    /// Messages actually read from the history
    pub messages_read: usize,
    /// Unique links in first-occurrence order
    pub links: Vec<String>,
    /// Link batches delivered
    pub batches_sent: usize,
}

/// A scan result plus the transient messages to delete
#[derive(Debug)]
pub struct ScanOutcome {
    /// Report or the reason the scan stopped
    pub result: Result<ScanReport, ScanError>,
    /// Session messages, the invoking message and the progress notice
    pub cleanup: Cleanup,
}

/// Drop repeated links, keeping the first occurrence of each.
///
/// # Examples
///
/// ```
/// use terascan_core::scan::dedup_links;
///
/// let links = ["A", "B", "A", "C", "B"].map(String::from).to_vec();
/// assert_eq!(dedup_links(links), vec!["A", "B", "C"]);
/// ```
#[must_use]
pub fn dedup_links(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(links.len());
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

struct Collected {
    read_marker: Option<i32>,
    messages_read: usize,
    links: Vec<String>,
}

/// Runs one scan of the selected chat and delivers the links.
pub struct ScanOrchestrator {
    history: Arc<dyn HistoryClient>,
    frontend: Arc<dyn FrontEnd>,
    policy: ScanPolicy,
    chunk_limit: usize,
    send_delay: Duration,
    scan_timeout: Duration,
}

impl ScanOrchestrator {
    /// Create an orchestrator using the limits from settings
    #[must_use]
    pub fn new(
        history: Arc<dyn HistoryClient>,
        frontend: Arc<dyn FrontEnd>,
        settings: &ScanSettings,
    ) -> Self {
        Self {
            history,
            frontend,
            policy: ScanPolicy::new(settings.bounded_scan_limit),
            chunk_limit: settings.message_chunk_limit.max(1),
            send_delay: settings.send_delay(),
            scan_timeout: settings.scan_timeout(),
        }
    }

    /// Scan the session's selected chat and reply in `reply_chat`.
    ///
    /// Failures are reported with a retained message and the home keyboard.
    /// The returned cleanup holds the session's transient messages, the
    /// invoking message and the progress notice; the caller resets the session.
    pub async fn run_scan(
        &self,
        session: &Session,
        reply_chat: i64,
        origin: Option<MessageRef>,
    ) -> ScanOutcome {
        let mut cleanup: Cleanup = session.transient_messages.iter().copied().collect();
        cleanup.extend(origin);

        let result = self.scan_selected(session, reply_chat, &mut cleanup).await;
        if let Err(e) = &result {
            warn!(operator_chat = reply_chat, "Scan stopped: {e}");
            self.report_failure(reply_chat, e).await;
        }

        ScanOutcome { result, cleanup }
    }

    async fn scan_selected(
        &self,
        session: &Session,
        reply_chat: i64,
        cleanup: &mut Cleanup,
    ) -> Result<ScanReport, ScanError> {
        let chat_id = session.selected_chat_id.ok_or(ScanError::NoChatSelected)?;
        let chat = self
            .history
            .resolve_entity(chat_id)
            .await
            .map_err(|e| ScanError::ChatUnreachable(e.to_string()))?;

        let unread_count = self.unread_count(session, chat_id).await;
        let plan = self.policy.decide(unread_count);
        info!(
            chat_id,
            limit = plan.limit,
            mode = ?plan.mode,
            "Starting scan of {}",
            chat.display_name
        );

        let progress = DefaultScanView::scanning(&chat.display_name, plan, unread_count);
        if let Some(notice) = self.send(reply_chat, &progress, Keyboard::None).await {
            cleanup.push(notice);
        }

        let collected = tokio::time::timeout(self.scan_timeout, self.collect(chat_id, plan.limit))
            .await
            .unwrap_or(Err(HistoryError::Timeout(self.scan_timeout)))
            .map_err(|e| ScanError::HistoryIteration(e.to_string()))?;

        let links = dedup_links(collected.links);
        let batches_sent = if links.is_empty() {
            self.send(reply_chat, &DefaultScanView::no_links(plan), Keyboard::Home)
                .await;
            0
        } else {
            let sent = self.deliver(reply_chat, &links).await;
            let summary = DefaultScanView::summary(&chat.display_name, links.len(), plan.limit);
            self.send(reply_chat, &summary, Keyboard::Home).await;
            sent
        };

        if let Err(e) = self.history.mark_read(chat_id, collected.read_marker).await {
            warn!(chat_id, "Failed to mark chat as read: {e}");
        }

        info!(
            chat_id,
            links = links.len(),
            messages_read = collected.messages_read,
            "Scan finished"
        );
        Ok(ScanReport {
            chat,
            plan,
            unread_count,
            messages_read: collected.messages_read,
            links,
            batches_sent,
        })
    }

    /// Unread count from a fresh dialog listing, falling back to the snapshot
    async fn unread_count(&self, session: &Session, chat_id: i64) -> u32 {
        let snapshot = session.chat(chat_id).map_or(0, |c| c.unread_count);
        match self.history.list_dialogs().await {
            Ok(dialogs) => dialogs
                .iter()
                .find(|d| d.id == chat_id)
                .map_or(snapshot, |d| d.unread_count),
            Err(e) => {
                warn!(chat_id, "Failed to refresh unread count, using snapshot: {e}");
                snapshot
            }
        }
    }

    /// Read up to `limit` messages, newest first; the first one is the read marker
    async fn collect(&self, chat_id: i64, limit: usize) -> Result<Collected, HistoryError> {
        let mut stream = self.history.iter_messages(chat_id, limit);
        let mut collected = Collected {
            read_marker: None,
            messages_read: 0,
            links: Vec::new(),
        };

        while let Some(message) = stream.next().await {
            let message = message?;
            collected.read_marker.get_or_insert(message.id);
            collected.messages_read += 1;
            if let Some(text) = message.searchable_text() {
                collected.links.extend(extract_links(&text));
            }
        }

        debug!(
            chat_id,
            messages_read = collected.messages_read,
            raw_links = collected.links.len(),
            "History read"
        );
        Ok(collected)
    }

    /// Send link batches with a pause between them; returns how many arrived
    async fn deliver(&self, reply_chat: i64, links: &[String]) -> usize {
        let mut sent = 0;
        for (i, batch) in chunk_links(links, self.chunk_limit).iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.send_delay).await;
            }
            if self.send(reply_chat, batch, Keyboard::None).await.is_some() {
                sent += 1;
            }
        }
        sent
    }

    async fn report_failure(&self, reply_chat: i64, error: &ScanError) {
        let text = match error {
            ScanError::NoChatSelected => DefaultScanView::no_chat_selected().to_string(),
            ScanError::ChatUnreachable(reason) => DefaultScanView::chat_unreachable(reason),
            ScanError::HistoryIteration(reason) => DefaultScanView::scan_failed(reason),
        };
        self.send(reply_chat, &text, Keyboard::Home).await;
    }

    async fn send(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Option<MessageRef> {
        match self.frontend.send_text(chat_id, text, keyboard).await {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(chat_id, "Failed to deliver scan message: {e}");
                None
            }
        }
    }
}
