//! History client backed by the automation account's MTProto session

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use grammers_client::types::{Chat, Media, Message};
use grammers_client::{Client, Config, InitParams};
use grammers_session::Session;
use grammers_tl_types as tl;
use std::collections::HashMap;
use std::sync::Arc;
use terascan_core::history::{
    ChatEntity, Dialog, HistoryClient, HistoryError, HistoryMessage, MessageStream,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::settings::HistorySettings;

/// Connected MTProto client with a cache of the chats seen while listing.
///
/// MTProto needs an access hash to address a chat, so chats are resolved
/// through the dialog list rather than by bare id.
#[derive(Clone)]
pub struct MtprotoHistory {
    client: Client,
    chats: Arc<RwLock<HashMap<i64, Chat>>>,
}

impl MtprotoHistory {
    /// Connect using the session file from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be loaded or the
    /// connection fails.
    pub async fn connect(settings: &HistorySettings) -> anyhow::Result<Self> {
        let session = Session::load_file_or_create(&settings.session_file)?;
        let client = Client::connect(Config {
            session,
            api_id: settings.api_id,
            api_hash: settings.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| anyhow::anyhow!("MTProto connection failed: {e}"))?;

        info!(session_file = %settings.session_file, "MTProto client connected");
        Ok(Self {
            client,
            chats: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Check if the session is logged in
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be asked.
    pub async fn is_authorized(&self) -> anyhow::Result<bool> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| anyhow::anyhow!("Authorization check failed: {e}"))
    }

    /// Persist the session (updated auth keys, data center) to disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_session(&self, path: &str) -> anyhow::Result<()> {
        self.client.session().save_to_file(path)?;
        Ok(())
    }

    async fn cached_chat(&self, chat_id: i64) -> Option<Chat> {
        self.chats.read().await.get(&chat_id).cloned()
    }

    async fn chat(&self, chat_id: i64) -> Result<Chat, HistoryError> {
        if let Some(chat) = self.cached_chat(chat_id).await {
            return Ok(chat);
        }
        debug!(chat_id, "Chat not cached, refreshing dialogs");
        self.list_dialogs().await?;
        self.cached_chat(chat_id)
            .await
            .ok_or_else(|| HistoryError::Unreachable {
                chat_id,
                reason: "chat is not among the account's dialogs".into(),
            })
    }
}

fn unread_count(raw: &tl::enums::Dialog) -> u32 {
    match raw {
        tl::enums::Dialog::Dialog(d) => u32::try_from(d.unread_count).unwrap_or(0),
        tl::enums::Dialog::Folder(_) => 0,
    }
}

/// Targets of every hyperlinked text entity, in order
fn hidden_urls(entities: &[tl::enums::MessageEntity]) -> Vec<String> {
    entities
        .iter()
        .filter_map(|entity| match entity {
            tl::enums::MessageEntity::TextUrl(link) => Some(link.url.clone()),
            _ => None,
        })
        .collect()
}

fn web_preview_url(message: &Message) -> Option<String> {
    match message.media()? {
        Media::WebPage(preview) => match &preview.raw.webpage {
            tl::enums::WebPage::Page(page) => Some(page.url.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn to_history_message(
    id: i32,
    text: &str,
    entities: &[tl::enums::MessageEntity],
    preview_url: Option<String>,
) -> HistoryMessage {
    HistoryMessage {
        id,
        text: (!text.is_empty()).then(|| text.to_string()),
        media_caption: None,
        preview_url,
        hidden_urls: hidden_urls(entities),
    }
}

fn history_message(message: &Message) -> HistoryMessage {
    to_history_message(
        message.id(),
        message.text(),
        message.fmt_entities().map_or(&[][..], Vec::as_slice),
        web_preview_url(message),
    )
}

#[async_trait]
impl HistoryClient for MtprotoHistory {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>, HistoryError> {
        let mut iter = self.client.iter_dialogs();
        let mut dialogs = Vec::new();
        let mut chats = HashMap::new();

        while let Some(dialog) = iter
            .next()
            .await
            .map_err(|e| HistoryError::Other(e.to_string()))?
        {
            let chat = dialog.chat().clone();
            dialogs.push(Dialog::new(chat.id(), chat.name(), unread_count(&dialog.raw)));
            chats.insert(chat.id(), chat);
        }

        debug!(count = dialogs.len(), "Dialogs listed");
        *self.chats.write().await = chats;
        Ok(dialogs)
    }

    fn iter_messages(&self, chat_id: i64, limit: usize) -> MessageStream {
        let history = self.clone();
        stream::once(async move {
            let chat = history.chat(chat_id).await?;
            Ok::<_, HistoryError>(history.client.iter_messages(chat.pack()).limit(limit))
        })
        .flat_map(|opened| match opened {
            Ok(iter) => stream::unfold(Some(iter), |iter| async move {
                let mut iter = iter?;
                match iter.next().await {
                    Ok(Some(message)) => Some((Ok(history_message(&message)), Some(iter))),
                    Ok(None) => None,
                    Err(e) => Some((Err(HistoryError::Iteration(e.to_string())), None)),
                }
            })
            .left_stream(),
            Err(e) => stream::once(async move { Err(e) }).right_stream(),
        })
        .boxed()
    }

    async fn mark_read(&self, chat_id: i64, up_to: Option<i32>) -> Result<(), HistoryError> {
        let packed = self.chat(chat_id).await?.pack();
        let Some(max_id) = up_to else {
            return self
                .client
                .mark_as_read(packed)
                .await
                .map_err(|e| HistoryError::Other(e.to_string()));
        };

        debug!(chat_id, max_id, "Marking chat as read");
        let result = if let Some(channel) = packed.try_to_input_channel() {
            self.client
                .invoke(&tl::functions::channels::ReadHistory { channel, max_id })
                .await
                .map(drop)
        } else {
            self.client
                .invoke(&tl::functions::messages::ReadHistory {
                    peer: packed.to_input_peer(),
                    max_id,
                })
                .await
                .map(drop)
        };
        result.map_err(|e| HistoryError::Other(e.to_string()))
    }

    async fn resolve_entity(&self, chat_id: i64) -> Result<ChatEntity, HistoryError> {
        let chat = self.chat(chat_id).await?;
        let name = chat.name();
        let display_name = if name.trim().is_empty() {
            chat.username()
                .map_or_else(|| chat_id.to_string(), str::to_string)
        } else {
            name.to_string()
        };
        Ok(ChatEntity {
            id: chat_id,
            display_name,
        })
    }
}
