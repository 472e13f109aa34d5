//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Sends and edits retry transient network failures using exponential backoff
//! with jitter. Deletions are attempted once.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Message, MessageId, ReplyMarkup};
use terascan_core::utils::retry_telegram_operation;
use tracing::debug;

/// Send a message with automatic retry on network failures.
///
/// # Errors
///
/// Returns the last error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    markup: Option<ReplyMarkup>,
) -> Result<Message> {
    retry_telegram_operation(|| async {
        let mut req = bot.send_message(chat_id, text);
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Replace a message text with automatic retry; the inline keyboard is dropped.
///
/// "message is not modified" counts as success.
///
/// # Errors
///
/// Returns the last error after all retries are exhausted.
pub async fn edit_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: &str,
) -> Result<()> {
    retry_telegram_operation(|| async {
        match bot.edit_message_text(chat_id, msg_id, text).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => {
                debug!("Message update skipped: message is not modified");
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
        }
    })
    .await
}

/// Delete a message once, without retry.
///
/// # Errors
///
/// Returns the Bot API error (already deleted, too old, missing rights).
pub async fn delete_message(bot: &Bot, chat_id: ChatId, msg_id: MessageId) -> Result<()> {
    bot.delete_message(chat_id, msg_id)
        .await
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("Telegram delete error: {e}"))
}
