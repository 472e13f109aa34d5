use crate::bot::UnauthorizedCache;
use anyhow::Result;
use std::sync::Arc;
use teloxide::{prelude::*, types::ParseMode, utils::command::BotCommands};
use terascan_core::frontend::{ButtonAction, MessageRef};
use terascan_core::router::{Inbound, InboundEvent, InteractionRouter};
use tracing::{debug, info};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Reset the session and show the home keyboard
    #[command(description = "Show the home menu.")]
    Start,
    /// Scan the selected chat
    #[command(description = "Scan the selected chat.")]
    Scan,
    /// Show bot statistics
    #[command(description = "Show bot statistics.")]
    Stats,
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Username or first name of the sender, for logs
pub fn get_user_name(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map(|user| {
            user.username
                .clone()
                .unwrap_or_else(|| user.first_name.clone())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Workflow event for an input carried by a message
#[must_use]
pub fn message_event(msg: &Message, input: Inbound) -> InboundEvent {
    InboundEvent::new(get_user_id_safe(msg), msg.chat.id.0, input)
        .with_origin(MessageRef::new(msg.chat.id.0, msg.id.0))
}

/// Workflow event for a button press; `None` for foreign payloads or
/// callbacks whose host message is gone.
#[must_use]
pub fn callback_event(q: &CallbackQuery) -> Option<InboundEvent> {
    let action = q.data.as_deref().and_then(ButtonAction::parse)?;
    let host = q.message.as_ref()?;
    let chat_id = host.chat().id.0;

    Some(
        InboundEvent::new(q.from.id.0.cast_signed(), chat_id, Inbound::Button(action))
            .with_origin(MessageRef::new(chat_id, host.id().0)),
    )
}

/// Command handler
///
/// # Errors
///
/// Returns an error if the statistics reply cannot be sent.
pub async fn command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    router: Arc<InteractionRouter>,
    cache: Arc<UnauthorizedCache>,
) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!("Command {cmd:?} received from user {user_id}.");

    match cmd {
        Command::Start => {
            router.dispatch(message_event(&msg, Inbound::Start)).await;
        }
        Command::Scan => {
            router.dispatch(message_event(&msg, Inbound::Scan)).await;
        }
        Command::Stats => stats(bot, msg, router, cache).await?,
    }
    Ok(())
}

/// Text message handler, covering the reply keyboard buttons
///
/// # Errors
///
/// Never fails; delivery problems are logged by the workflow.
pub async fn handle_text(msg: Message, router: Arc<InteractionRouter>) -> Result<()> {
    let text = msg.text().unwrap_or_default().to_string();
    debug!(user_id = get_user_id_safe(&msg), "Text received: {text}");
    router.dispatch(message_event(&msg, Inbound::Text(text))).await;
    Ok(())
}

/// Inline button handler
///
/// # Errors
///
/// Never fails; a failed callback answer only leaves a spinner on the button.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    router: Arc<InteractionRouter>,
) -> Result<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        debug!("Failed to answer callback query: {e}");
    }

    match callback_event(&q) {
        Some(event) => {
            router.dispatch(event).await;
        }
        None => debug!(
            user_id = q.from.id.0,
            "Ignoring callback with payload {:?}",
            q.data
        ),
    }
    Ok(())
}

/// Statistics handler
///
/// # Errors
///
/// Returns an error if the message cannot be sent.
pub async fn stats(
    bot: Bot,
    msg: Message,
    router: Arc<InteractionRouter>,
    cache: Arc<UnauthorizedCache>,
) -> Result<()> {
    let cooldown_mins = cache.cooldown().as_secs() / 60;

    let stats_text = format!(
        "<b>📊 Bot Statistics</b>\n\n\
        <b>Sessions:</b> {}\n\n\
        <b>Anti-spam protection (Access Denied):</b>\n\
        • Cooldown period: {} min.\n\
        • Cache entries: {}\n\
        • Blocked notifications: {}",
        router.sessions().len().await,
        cooldown_mins,
        cache.entry_count(),
        cache.silenced_count(),
    );

    bot.send_message(msg.chat.id, stats_text)
        .parse_mode(ParseMode::Html)
        .await?;

    info!("Responded to stats from user {}.", get_user_id_safe(&msg));
    Ok(())
}
