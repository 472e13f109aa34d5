use super::keyboards::reply_markup;
use super::resilient::{delete_message, edit_message_resilient, send_message_resilient};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};
use terascan_core::frontend::{DeliveryError, FrontEnd, Keyboard, MessageRef};

/// Operator front end backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramFrontEnd {
    bot: Bot,
}

impl TelegramFrontEnd {
    /// Wrap a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl FrontEnd for TelegramFrontEnd {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<MessageRef, DeliveryError> {
        let msg = send_message_resilient(&self.bot, ChatId(chat_id), text, reply_markup(&keyboard))
            .await
            .map_err(|e| DeliveryError::Send(e.to_string()))?;
        Ok(MessageRef::new(msg.chat.id.0, msg.id.0))
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), DeliveryError> {
        edit_message_resilient(
            &self.bot,
            ChatId(message.chat_id),
            MessageId(message.message_id),
            text,
        )
        .await
        .map_err(|e| DeliveryError::Edit(e.to_string()))
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), DeliveryError> {
        delete_message(
            &self.bot,
            ChatId(message.chat_id),
            MessageId(message.message_id),
        )
        .await
        .map_err(|e| DeliveryError::Delete(e.to_string()))
    }
}
