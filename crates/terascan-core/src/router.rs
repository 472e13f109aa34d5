//! Interaction state machine
//!
//! Maps operator input onto session transitions. Every transition returns a
//! [`Cleanup`] with the transient messages it leaves behind; [`dispatch`]
//! hands them to the [`CleanupScheduler`].
//!
//! [`dispatch`]: InteractionRouter::dispatch

use crate::config::ScanSettings;
use crate::frontend::{ButtonAction, FrontEnd, Keyboard, MessageRef};
use crate::history::HistoryClient;
use crate::scan::ScanOrchestrator;
use crate::session::{
    ChatSummary, Cleanup, CleanupScheduler, PaginationController, ScheduledDeletion, Session,
    SessionState, SessionStore,
};
use crate::views::{DefaultScanView, ScanView};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Operator input, already stripped of transport details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The start command
    Start,
    /// The scan command
    Scan,
    /// Free text, including reply keyboard presses
    Text(String),
    /// An inline button press
    Button(ButtonAction),
}

/// One inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Operator user id, the session key
    pub operator: i64,
    /// Chat to reply in
    pub chat_id: i64,
    /// The message that carried the input (text message or button host)
    pub origin: Option<MessageRef>,
    /// What the operator did
    pub input: Inbound,
}

impl InboundEvent {
    /// Event without an origin message
    #[must_use]
    pub const fn new(operator: i64, chat_id: i64, input: Inbound) -> Self {
        Self {
            operator,
            chat_id,
            origin: None,
            input,
        }
    }

    /// Attach the message that carried the input
    #[must_use]
    pub fn with_origin(mut self, origin: MessageRef) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// Reply keyboard words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// Reset to the idle menu
    Start,
    /// Load and paginate the chat list
    List,
    /// Scan the selected chat
    Scan,
    /// Drop the selection
    Cancel,
}

impl Keyword {
    /// Match trimmed text case-insensitively
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_uppercase().as_str() {
            "START" => Some(Self::Start),
            "LIST" => Some(Self::List),
            "SCAN" => Some(Self::Scan),
            "CANCEL" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Top-level state machine shared by all operators
pub struct InteractionRouter {
    sessions: Arc<SessionStore>,
    history: Arc<dyn HistoryClient>,
    frontend: Arc<dyn FrontEnd>,
    pagination: PaginationController,
    orchestrator: ScanOrchestrator,
    scheduler: CleanupScheduler,
}

impl InteractionRouter {
    /// Create a router with an empty session store
    #[must_use]
    pub fn new(
        history: Arc<dyn HistoryClient>,
        frontend: Arc<dyn FrontEnd>,
        settings: &ScanSettings,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            pagination: PaginationController::new(frontend.clone(), settings),
            orchestrator: ScanOrchestrator::new(history.clone(), frontend.clone(), settings),
            scheduler: CleanupScheduler::new(frontend.clone(), settings.cleanup_delay()),
            history,
            frontend,
        }
    }

    /// Session store, shared with the transport for statistics
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle an event and schedule deletion of what it left behind
    pub async fn dispatch(&self, event: InboundEvent) -> Vec<ScheduledDeletion> {
        let cleanup = self.handle(event).await;
        if !cleanup.is_empty() {
            debug!(count = cleanup.len(), "Scheduling transient message cleanup");
        }
        self.scheduler.schedule(cleanup)
    }

    /// Handle an event; the returned cleanup is not scheduled
    pub async fn handle(&self, event: InboundEvent) -> Cleanup {
        let InboundEvent {
            operator,
            chat_id,
            origin,
            input,
        } = event;

        match input {
            Inbound::Start => self.start(operator, chat_id).await,
            Inbound::Scan => self.scan(operator, chat_id, origin).await,
            Inbound::Button(action) => self.button(operator, chat_id, origin, action).await,
            Inbound::Text(text) => match Keyword::parse(&text) {
                Some(Keyword::Start) => self.start(operator, chat_id).await,
                Some(Keyword::List) => self.list(operator, chat_id).await,
                Some(Keyword::Scan) => self.scan(operator, chat_id, origin).await,
                Some(Keyword::Cancel) => self.cancel(operator, chat_id).await,
                None => self.unknown(operator, chat_id).await,
            },
        }
    }

    async fn start(&self, operator: i64, chat_id: i64) -> Cleanup {
        let cleanup = self.sessions.reset(operator).await.take_transient();

        let mut session = Session::default();
        if let Some(menu) = self
            .send(chat_id, DefaultScanView::bot_ready(), Keyboard::Home)
            .await
        {
            session.track(menu);
        }
        self.sessions.replace(operator, session).await;
        cleanup
    }

    async fn list(&self, operator: i64, chat_id: i64) -> Cleanup {
        let mut cleanup = self.sessions.get_or_create(operator).await.take_transient();
        let fetching = self
            .send(chat_id, DefaultScanView::fetching_chats(), Keyboard::Hide)
            .await;

        let dialogs = match self.history.list_dialogs().await {
            Ok(dialogs) => dialogs,
            Err(e) => {
                warn!(operator, "Failed to list chats: {e}");
                self.send(chat_id, &DefaultScanView::list_failed(&e.to_string()), Keyboard::Home)
                    .await;
                cleanup.extend(fetching);
                self.sessions.replace(operator, Session::default()).await;
                return cleanup;
            }
        };

        info!(operator, chats = dialogs.len(), "Chat list loaded");
        let chats = dialogs.into_iter().map(ChatSummary::from).collect();
        let mut session = Session::listing(chats, fetching.into_iter().collect());
        self.pagination.show_page(chat_id, &mut session).await;
        self.sessions.replace(operator, session).await;
        cleanup
    }

    async fn button(
        &self,
        operator: i64,
        chat_id: i64,
        origin: Option<MessageRef>,
        action: ButtonAction,
    ) -> Cleanup {
        let mut session = self.sessions.get_or_create(operator).await;
        if session.state() != SessionState::Listing {
            debug!(operator, ?action, "Button ignored outside of chat listing");
            return Cleanup::new();
        }

        match action {
            ButtonAction::Next | ButtonAction::Prev => {
                let moved = if action == ButtonAction::Next {
                    self.pagination.next_page(&mut session)
                } else {
                    self.pagination.prev_page(&mut session)
                };
                if moved {
                    self.pagination.show_page(chat_id, &mut session).await;
                    self.sessions.replace(operator, session).await;
                } else {
                    debug!(operator, page = session.page, "Page change out of range");
                }
                Cleanup::new()
            }
            ButtonAction::Select(selected) => {
                self.select(operator, chat_id, origin, session, selected)
                    .await
            }
        }
    }

    async fn select(
        &self,
        operator: i64,
        chat_id: i64,
        origin: Option<MessageRef>,
        mut session: Session,
        selected: i64,
    ) -> Cleanup {
        let Some(snapshot_name) = session.chat(selected).map(|c| c.display_name.clone()) else {
            debug!(operator, selected, "Selected chat is not in the snapshot");
            return Cleanup::new();
        };

        let page = session.page_message.or(origin);
        let mut cleanup = self.pagination.select(&mut session, selected);
        let acknowledged = match page {
            Some(page) => match self
                .frontend
                .edit_text(page, DefaultScanView::chat_selected_ack())
                .await
            {
                Ok(()) => {
                    cleanup.push(page);
                    true
                }
                Err(e) => {
                    debug!(operator, "Selection acknowledgement edit failed: {e}");
                    false
                }
            },
            None => false,
        };
        if !acknowledged {
            let ack = self
                .send(chat_id, DefaultScanView::chat_selected_ack(), Keyboard::None)
                .await;
            cleanup.extend(ack);
        }

        let name = match self.history.resolve_entity(selected).await {
            Ok(entity) => entity.display_name,
            Err(e) => {
                debug!(selected, "Using snapshot name, entity lookup failed: {e}");
                snapshot_name
            }
        };
        info!(operator, selected, "Chat selected: {name}");

        if let Some(prompt) = self
            .send(chat_id, &DefaultScanView::selected(&name), Keyboard::ScanConfirm)
            .await
        {
            session.track(prompt);
        }
        self.sessions.replace(operator, session).await;
        cleanup
    }

    async fn scan(&self, operator: i64, chat_id: i64, origin: Option<MessageRef>) -> Cleanup {
        let session = self.sessions.get_or_create(operator).await;
        let outcome = self.orchestrator.run_scan(&session, chat_id, origin).await;
        if let Ok(report) = &outcome.result {
            info!(
                operator,
                links = report.links.len(),
                batches = report.batches_sent,
                "Scan delivered"
            );
        }
        self.sessions.reset(operator).await;
        outcome.cleanup
    }

    async fn cancel(&self, operator: i64, chat_id: i64) -> Cleanup {
        let cleanup = self.sessions.reset(operator).await.take_transient();
        self.send(chat_id, DefaultScanView::cancelled(), Keyboard::Home)
            .await;
        cleanup
    }

    async fn unknown(&self, operator: i64, chat_id: i64) -> Cleanup {
        debug!(operator, "Unrecognized text");
        self.send(chat_id, DefaultScanView::unknown_action(), Keyboard::Home)
            .await;
        Cleanup::new()
    }

    async fn send(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Option<MessageRef> {
        match self.frontend.send_text(chat_id, text, keyboard).await {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(chat_id, "Failed to deliver message: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryMessage;
    use crate::testing::{FakeHistory, RecordingFrontEnd};
    use crate::views::NEXT_LABEL;

    const OPERATOR: i64 = 42;
    const CHAT: i64 = 42;
    const SOURCE_CHAT: i64 = -100_500;

    fn router(history: FakeHistory) -> (InteractionRouter, Arc<RecordingFrontEnd>) {
        router_with(history, RecordingFrontEnd::new())
    }

    fn router_with(
        history: FakeHistory,
        frontend: RecordingFrontEnd,
    ) -> (InteractionRouter, Arc<RecordingFrontEnd>) {
        let frontend = Arc::new(frontend);
        let settings = ScanSettings {
            cleanup_delay_ms: 0,
            send_delay_ms: 0,
            ..ScanSettings::default()
        };
        let router = InteractionRouter::new(Arc::new(history), frontend.clone(), &settings);
        (router, frontend)
    }

    fn text(input: &str) -> InboundEvent {
        InboundEvent::new(OPERATOR, CHAT, Inbound::Text(input.to_string()))
    }

    fn button(action: ButtonAction) -> InboundEvent {
        InboundEvent::new(OPERATOR, CHAT, Inbound::Button(action))
    }

    fn many_chats(history: FakeHistory, n: i64) -> FakeHistory {
        (0..n).fold(history, |h, i| h.with_dialog(i + 1, &format!("chat {i}"), 0))
    }

    async fn session(router: &InteractionRouter) -> Session {
        router
            .sessions()
            .get(OPERATOR)
            .await
            .expect("session exists")
    }

    #[test]
    fn test_keyword_parsing() {
        assert_eq!(Keyword::parse("  list "), Some(Keyword::List));
        assert_eq!(Keyword::parse("Scan"), Some(Keyword::Scan));
        assert_eq!(Keyword::parse("cancel"), Some(Keyword::Cancel));
        assert_eq!(Keyword::parse("START"), Some(Keyword::Start));
        assert_eq!(Keyword::parse("LISTS"), None);
    }

    #[tokio::test]
    async fn test_list_with_zero_chats() {
        let (router, frontend) = router(FakeHistory::new());

        router.handle(text("LIST")).await;

        let sent = frontend.sent();
        assert_eq!(sent[0].text, "⏳ Fetching chats...");
        assert_eq!(sent[0].keyboard, Keyboard::Hide);
        assert_eq!(sent[1].text, "❌ No chats found.");
        assert_eq!(sent[1].keyboard, Keyboard::Home);

        let session = session(&router).await;
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.page_message, None);
    }

    #[tokio::test]
    async fn test_list_survives_undeliverable_messages() {
        let history = many_chats(FakeHistory::new(), 3);
        let (router, frontend) = router_with(history, RecordingFrontEnd::new().failing_sends());

        let cleanup = router.handle(text("LIST")).await;

        assert!(cleanup.is_empty());
        assert!(frontend.sent().is_empty());
        let session = session(&router).await;
        assert_eq!(session.state(), SessionState::Listing);
        assert_eq!(session.chats.len(), 3);
        assert_eq!(session.page_message, None);
        assert!(session.transient_messages.is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_is_reported() {
        let (router, frontend) = router(FakeHistory::new().failing_listing());

        let cleanup = router.handle(text("list")).await;

        assert!(frontend.texts()[1].starts_with("❌ Could not fetch chats:"));
        assert_eq!(cleanup.len(), 1);
        assert_eq!(session(&router).await.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_full_flow_with_duplicate_link() {
        let link = "https://www.terabox.app/s/dup";
        let history = FakeHistory::new()
            .with_dialog(SOURCE_CHAT, "Deals", 3)
            .with_messages(
                SOURCE_CHAT,
                vec![
                    HistoryMessage::text(12, link),
                    HistoryMessage::text(11, format!("again: {link}")),
                    HistoryMessage::text(10, "no link"),
                ],
            );
        let (router, frontend) = router(history);

        router.handle(InboundEvent::new(OPERATOR, CHAT, Inbound::Start)).await;
        let list_cleanup = router.handle(text("LIST")).await;
        assert_eq!(list_cleanup.len(), 1, "the idle menu is cleaned up");
        assert_eq!(session(&router).await.state(), SessionState::Listing);

        let select_cleanup = router
            .handle(button(ButtonAction::Select(SOURCE_CHAT)))
            .await;
        let selected = session(&router).await;
        assert_eq!(selected.state(), SessionState::Selected);
        assert_eq!(selected.transient_messages.len(), 1);
        assert_eq!(select_cleanup.len(), 2, "fetching notice and page");
        assert_eq!(frontend.edits()[0].1, "✅ Chat Selected\nNow press SCAN");
        assert!(frontend
            .texts()
            .contains(&"Selected: Deals\nPress SCAN to start scanning.".to_string()));

        let origin = MessageRef::new(CHAT, 9000);
        let scan_cleanup = router
            .handle(InboundEvent::new(OPERATOR, CHAT, Inbound::Text("SCAN".into())).with_origin(origin))
            .await;

        let texts = frontend.texts();
        assert!(texts.contains(&link.to_string()));
        assert_eq!(
            texts.last().map(String::as_str),
            Some("✅ Processed Deals\n🔗 Found 1 Terabox link(s)\n📨 Scanned 3 message(s)")
        );
        assert!(scan_cleanup.contains(&origin));
        assert!(scan_cleanup.contains(&selected.transient_messages[0]));
        assert_eq!(session(&router).await, Session::default());
    }

    #[tokio::test]
    async fn test_scan_without_selection() {
        let (router, frontend) = router(FakeHistory::new());

        router
            .handle(InboundEvent::new(OPERATOR, CHAT, Inbound::Scan))
            .await;

        let sent = frontend.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "❌ No chat selected. Use LIST first.");
        assert_eq!(sent[0].keyboard, Keyboard::Home);
        assert_eq!(session(&router).await.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_paging_keeps_one_page_visible() {
        let (router, frontend) = router(many_chats(FakeHistory::new(), 75));
        router.handle(text("LIST")).await;

        for action in [ButtonAction::Next, ButtonAction::Next, ButtonAction::Next] {
            router.handle(button(action)).await;
        }
        assert_eq!(session(&router).await.page, 2);

        for _ in 0..2 {
            router.handle(button(ButtonAction::Prev)).await;
        }
        let session = session(&router).await;
        assert_eq!(session.page, 0);

        let live = frontend.live_with_text(DefaultScanView::select_chat());
        assert_eq!(live.len(), 1);
        assert_eq!(session.page_message, Some(live[0].message));
        match &live[0].keyboard {
            Keyboard::Inline(rows) => {
                let nav = rows.last().expect("nav row");
                assert_eq!(nav.len(), 1);
                assert_eq!(nav[0].label, NEXT_LABEL);
            }
            other => panic!("expected inline keyboard, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_buttons_ignored_outside_listing() {
        let (router, frontend) = router(many_chats(FakeHistory::new(), 3));

        let cleanup = router.handle(button(ButtonAction::Next)).await;
        assert!(cleanup.is_empty());
        assert!(frontend.sent().is_empty());

        router.handle(text("LIST")).await;
        router.handle(button(ButtonAction::Select(1))).await;
        let sent_before = frontend.sent().len();
        router.handle(button(ButtonAction::Select(2))).await;
        assert_eq!(frontend.sent().len(), sent_before);
        assert_eq!(session(&router).await.selected_chat_id, Some(1));
    }

    #[tokio::test]
    async fn test_selection_ack_falls_back_to_new_message() {
        let (router, frontend) = router_with(
            many_chats(FakeHistory::new(), 2),
            RecordingFrontEnd::new().failing_edits(),
        );
        router.handle(text("LIST")).await;

        let cleanup = router.handle(button(ButtonAction::Select(2))).await;

        let ack = frontend
            .sent()
            .into_iter()
            .find(|m| m.text == DefaultScanView::chat_selected_ack())
            .expect("ack sent as new message");
        assert!(cleanup.contains(&ack.message));
    }

    #[tokio::test]
    async fn test_cancel_resets_and_cleans_up() {
        let (router, frontend) = router(many_chats(FakeHistory::new(), 2));
        router.handle(text("LIST")).await;
        router.handle(button(ButtonAction::Select(1))).await;

        let cleanup = router.handle(text("Cancel")).await;

        assert_eq!(cleanup.len(), 1, "the scan prompt is cleaned up");
        assert_eq!(
            frontend.texts().last().map(String::as_str),
            Some("Cancelled. Back to home.")
        );
        assert_eq!(session(&router).await.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_unknown_text_keeps_session() {
        let (router, frontend) = router(many_chats(FakeHistory::new(), 2));
        router.handle(text("LIST")).await;
        let before = session(&router).await;

        let cleanup = router.handle(text("hello")).await;

        assert!(cleanup.is_empty());
        assert_eq!(session(&router).await, before);
        assert_eq!(
            frontend.texts().last().map(String::as_str),
            Some("Unknown action. Use START or LIST.")
        );
    }

    #[tokio::test]
    async fn test_dispatch_deletes_transients() {
        let (router, frontend) = router(FakeHistory::new());
        router
            .dispatch(InboundEvent::new(OPERATOR, CHAT, Inbound::Start))
            .await;
        let menu = frontend.sent()[0].message;

        for deletion in router.dispatch(text("START")).await {
            assert!(deletion.join().await);
        }

        assert_eq!(frontend.deleted(), vec![menu]);
    }

    #[tokio::test]
    async fn test_operators_have_independent_sessions() {
        let (router, _frontend) = router(many_chats(FakeHistory::new(), 40));
        let other = 77;

        let (_, _) = tokio::join!(
            router.handle(text("LIST")),
            router.handle(InboundEvent::new(other, other, Inbound::Text("LIST".into())))
        );
        router.handle(button(ButtonAction::Next)).await;

        let mine = session(&router).await;
        let theirs = router.sessions().get(other).await.expect("session exists");
        assert_eq!(mine.page, 1);
        assert_eq!(theirs.page, 0);
        assert_eq!(router.sessions().len().await, 2);
    }
}
