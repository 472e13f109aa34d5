use super::cleanup::delete_best_effort;
use super::{Cleanup, Session};
use crate::config::ScanSettings;
use crate::frontend::{ButtonAction, FrontEnd, InlineButton, Keyboard};
use crate::utils::truncate_str;
use crate::views::{DefaultScanView, ScanView, NEXT_LABEL, PREV_LABEL};
use std::sync::Arc;
use tracing::{debug, warn};

/// A rendered pagination page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Header text
    pub text: String,
    /// One row per chat plus an optional navigation row
    pub keyboard: Keyboard,
}

/// Render the current page of the session's chat snapshot.
///
/// Returns `None` when the snapshot is empty or the page is out of range.
#[must_use]
pub fn render_page(session: &Session, page_size: usize, label_max_chars: usize) -> Option<PageView> {
    let page_size = page_size.max(1);
    let start = session.page.checked_mul(page_size)?;
    let end = start.saturating_add(page_size).min(session.chats.len());
    let slice = session.chats.get(start..end).filter(|s| !s.is_empty())?;

    let mut rows: Vec<Vec<InlineButton>> = slice
        .iter()
        .map(|chat| {
            let label = DefaultScanView::chat_label(&chat.display_name, chat.unread_count);
            vec![InlineButton::new(
                truncate_str(label, label_max_chars),
                ButtonAction::Select(chat.chat_id),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if session.page > 0 {
        nav.push(InlineButton::new(PREV_LABEL, ButtonAction::Prev));
    }
    if end < session.chats.len() {
        nav.push(InlineButton::new(NEXT_LABEL, ButtonAction::Next));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    Some(PageView {
        text: DefaultScanView::select_chat().to_string(),
        keyboard: Keyboard::Inline(rows),
    })
}

/// Shows the chat snapshot page by page, keeping at most one page visible.
pub struct PaginationController {
    frontend: Arc<dyn FrontEnd>,
    page_size: usize,
    label_max_chars: usize,
}

impl PaginationController {
    /// Create a controller with the page size and label limit from settings
    #[must_use]
    pub fn new(frontend: Arc<dyn FrontEnd>, settings: &ScanSettings) -> Self {
        Self {
            frontend,
            page_size: settings.page_size.max(1),
            label_max_chars: settings.label_max_chars,
        }
    }

    /// Chats per page
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the visible page with the session's current page.
    ///
    /// The previous page message is deleted first, best effort. With an empty
    /// snapshot a "no chats" notice is sent instead and no page is created.
    pub async fn show_page(&self, chat_id: i64, session: &mut Session) {
        if let Some(previous) = session.page_message.take() {
            delete_best_effort(self.frontend.as_ref(), previous).await;
            session.untrack(previous);
        }

        session.clamp_page(self.page_size);
        let Some(view) = render_page(session, self.page_size, self.label_max_chars) else {
            match self
                .frontend
                .send_text(chat_id, DefaultScanView::no_chats(), Keyboard::Home)
                .await
            {
                Ok(message) => session.track(message),
                Err(e) => warn!("Failed to send empty chat list notice: {e}"),
            }
            return;
        };

        match self
            .frontend
            .send_text(chat_id, &view.text, view.keyboard)
            .await
        {
            Ok(message) => {
                debug!(page = session.page, message_id = message.message_id, "Chat page shown");
                session.page_message = Some(message);
                session.track(message);
            }
            Err(e) => warn!("Failed to send chat page {}: {e}", session.page),
        }
    }

    /// Advance one page; `false` when already on the last page
    pub fn next_page(&self, session: &mut Session) -> bool {
        let before = session.page;
        session.page = session.page.saturating_add(1);
        session.clamp_page(self.page_size);
        session.page != before
    }

    /// Go back one page; `false` when already on the first page
    pub fn prev_page(&self, session: &mut Session) -> bool {
        let before = session.page;
        session.page = session.page.saturating_sub(1);
        session.clamp_page(self.page_size);
        session.page != before
    }

    /// Select a chat: the page and every transient message are handed back
    /// for cleanup and the session moves to the selected state.
    pub fn select(&self, session: &mut Session, chat_id: i64) -> Cleanup {
        let cleanup = session.take_transient();
        session.selected_chat_id = Some(chat_id);
        cleanup
    }
}
