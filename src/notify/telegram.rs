//! Telegram Bot API client and the moderator / broadcast surfaces built on it.
//!
//! Plain `reqwest` + JSON calls against `https://api.telegram.org/bot<token>/<method>`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::updates::{Message, Update};
use super::{BroadcastSurface, ModeratorSurface, PostingRef};
use crate::decision::{callback_data, ModerationAction};
use crate::error::SurfaceError;
use crate::store::Token;

const API_BASE: &str = "https://api.telegram.org";

const APPROVE_LABEL: &str = "✅ Публікувати";
const REJECT_LABEL: &str = "❌ Відхилити";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

pub struct TelegramClient {
    bot_token: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &API_BASE)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bot_token: bot_token.into(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.bot_token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<T, SurfaceError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| SurfaceError::Http {
                method: method.to_string(),
                // without_url: the URL carries the bot token
                reason: e.without_url().to_string(),
            })?;

        let parsed: ApiResponse<T> =
            resp.json().await.map_err(|e| SurfaceError::InvalidResponse {
                method: method.to_string(),
                reason: e.without_url().to_string(),
            })?;

        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(SurfaceError::InvalidResponse {
                method: method.to_string(),
                reason: "ok without result".into(),
            }),
            (false, _) => Err(SurfaceError::Api {
                method: method.to_string(),
                description: parsed.description.unwrap_or_default(),
            }),
        }
    }

    /// Send with Markdown first, retrying as plain text when Telegram rejects
    /// the formatting (truncation can cut an entity in half).
    async fn call_markdown<T: DeserializeOwned>(
        &self,
        method: &str,
        mut body: Value,
    ) -> Result<T, SurfaceError> {
        body["parse_mode"] = json!("Markdown");
        match self.call(method, &body, self.timeout).await {
            Err(SurfaceError::Api { description, .. }) if is_entity_error(&description) => {
                tracing::warn!(method, %description, "Markdown rejected; retrying without parse_mode");
                if let Some(obj) = body.as_object_mut() {
                    obj.remove("parse_mode");
                }
                self.call(method, &body, self.timeout).await
            }
            other => other,
        }
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Value>,
        preview: Value,
    ) -> Result<Message, SurfaceError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "link_preview_options": preview,
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = kb;
        }
        self.call_markdown("sendMessage", body).await
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
    ) -> Result<Message, SurfaceError> {
        let body = json!({
            "chat_id": chat_id,
            "photo": photo_url,
            "caption": caption,
        });
        self.call_markdown("sendPhoto", body).await
    }

    /// Replace a message's text. An empty keyboard removes existing buttons.
    pub async fn edit_message_text(
        &self,
        posting: &PostingRef,
        text: &str,
        preview: Value,
    ) -> Result<(), SurfaceError> {
        let body = json!({
            "chat_id": posting.chat_id,
            "message_id": posting.message_id,
            "text": text,
            "link_preview_options": preview,
            "reply_markup": { "inline_keyboard": [] },
        });
        ignore_not_modified(self.call_markdown::<Value>("editMessageText", body).await)
    }

    pub async fn edit_message_caption(
        &self,
        posting: &PostingRef,
        caption: &str,
    ) -> Result<(), SurfaceError> {
        let body = json!({
            "chat_id": posting.chat_id,
            "message_id": posting.message_id,
            "caption": caption,
        });
        ignore_not_modified(self.call_markdown::<Value>("editMessageCaption", body).await)
    }

    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<(), SurfaceError> {
        let body = json!({ "callback_query_id": callback_id });
        self.call::<bool>("answerCallbackQuery", &body, self.timeout)
            .await
            .map(|_| ())
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), SurfaceError> {
        let body = json!({ "drop_pending_updates": drop_pending_updates });
        self.call::<bool>("deleteWebhook", &body, self.timeout)
            .await
            .map(|_| ())
    }

    /// Long-poll for updates. The HTTP timeout is stretched past the poll window.
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_secs: u64,
    ) -> Result<Vec<Update>, SurfaceError> {
        let body = json!({
            "offset": offset,
            "timeout": poll_secs,
            "allowed_updates": ["callback_query", "edited_channel_post", "edited_message"],
        });
        let window = Duration::from_secs(poll_secs) + self.timeout;
        self.call("getUpdates", &body, window).await
    }
}

fn is_entity_error(description: &str) -> bool {
    description.contains("can't parse entities")
        || description.contains("can't find end of the entity")
}

/// Editing to identical content is rejected by Telegram; treat it as done.
fn ignore_not_modified(res: Result<Value, SurfaceError>) -> Result<(), SurfaceError> {
    match res {
        Ok(_) => Ok(()),
        Err(SurfaceError::Api { description, .. })
            if description.contains("message is not modified") =>
        {
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Inline keyboard with the approve / reject pair bound to `token`.
pub fn moderation_keyboard(token: &Token) -> Value {
    json!({
        "inline_keyboard": [[
            { "text": APPROVE_LABEL, "callback_data": callback_data(ModerationAction::Approve, token) },
            { "text": REJECT_LABEL, "callback_data": callback_data(ModerationAction::Reject, token) },
        ]]
    })
}

/// Link preview settings: a large preview of the image when there is one,
/// otherwise none.
pub fn preview_for(image_url: Option<&str>) -> Value {
    match image_url {
        Some(url) => json!({ "url": url, "prefer_large_media": true, "show_above_text": true }),
        None => json!({ "is_disabled": true }),
    }
}

/// Moderator chat surface.
pub struct TelegramModerator {
    client: Arc<TelegramClient>,
    chat_id: i64,
}

impl TelegramModerator {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl ModeratorSurface for TelegramModerator {
    async fn post_candidate(
        &self,
        text: &str,
        image_url: Option<&str>,
        token: &Token,
    ) -> Result<PostingRef, SurfaceError> {
        let msg = self
            .client
            .send_message(
                self.chat_id,
                text,
                Some(moderation_keyboard(token)),
                preview_for(image_url),
            )
            .await?;
        Ok(msg.posting_ref())
    }

    async fn finalize(&self, posting: &PostingRef, text: &str) -> Result<(), SurfaceError> {
        self.client
            .edit_message_text(posting, text, preview_for(None))
            .await
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), SurfaceError> {
        self.client.answer_callback_query(callback_id).await
    }
}

/// Public channel surface.
pub struct TelegramBroadcaster {
    client: Arc<TelegramClient>,
    chat_id: i64,
}

impl TelegramBroadcaster {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl BroadcastSurface for TelegramBroadcaster {
    async fn publish(
        &self,
        text: &str,
        image_url: Option<&str>,
    ) -> Result<PostingRef, SurfaceError> {
        let msg = match image_url {
            Some(url) => self.client.send_photo(self.chat_id, url, text).await?,
            None => {
                self.client
                    .send_message(self.chat_id, text, None, json!({ "is_disabled": false }))
                    .await?
            }
        };
        Ok(msg.posting_ref())
    }

    async fn edit(
        &self,
        posting: &PostingRef,
        text: &str,
        has_image: bool,
    ) -> Result<(), SurfaceError> {
        if has_image {
            self.client.edit_message_caption(posting, text).await
        } else {
            self.client
                .edit_message_text(posting, text, json!({ "is_disabled": false }))
                .await
        }
    }
}
