// src/notify/updates.rs
//! Inbound Telegram updates: moderator button presses and edits of moderator
//! postings, routed to the decision handler and the edit propagator.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::telegram::TelegramClient;
use super::{ModeratorSurface, PostingRef};
use crate::compose::ALREADY_PROCESSED;
use crate::decision::{parse_callback_data, DecisionHandler, DecisionOutcome};
use crate::edits::{EditOutcome, EditPropagator};

const LONG_POLL_SECS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default)]
    pub edited_channel_post: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Message {
    pub fn posting_ref(&self) -> PostingRef {
        PostingRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }

    /// Text for plain messages, caption for media messages.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

/// What a single update turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Decision(DecisionOutcome),
    Edit(EditOutcome),
    Skipped,
}

pub struct UpdateDispatcher {
    decisions: DecisionHandler,
    edits: Option<EditPropagator>,
    moderator: Arc<dyn ModeratorSurface>,
    moderator_chat: i64,
}

impl UpdateDispatcher {
    /// `edits` is `None` when edit propagation is switched off.
    pub fn new(
        decisions: DecisionHandler,
        edits: Option<EditPropagator>,
        moderator: Arc<dyn ModeratorSurface>,
        moderator_chat: i64,
    ) -> Self {
        Self {
            decisions,
            edits,
            moderator,
            moderator_chat,
        }
    }

    pub async fn dispatch(&self, update: &Update) -> Dispatched {
        if let Some(cb) = &update.callback_query {
            return self.on_callback(cb).await;
        }

        let edited = update
            .edited_channel_post
            .as_ref()
            .or(update.edited_message.as_ref());
        if let (Some(msg), Some(edits)) = (edited, &self.edits) {
            if msg.chat.id != self.moderator_chat {
                return Dispatched::Skipped;
            }
            let Some(body) = msg.body() else {
                return Dispatched::Skipped;
            };
            let outcome = edits.on_moderator_edit(&msg.posting_ref(), body).await;
            return Dispatched::Edit(outcome);
        }

        Dispatched::Skipped
    }

    async fn on_callback(&self, cb: &CallbackQuery) -> Dispatched {
        if let Err(e) = self.moderator.acknowledge(&cb.id).await {
            debug!(target: "moderation", error = %e, "callback acknowledge failed");
        }

        let Some((action, raw_token)) = cb.data.as_deref().and_then(parse_callback_data) else {
            debug!(target: "moderation", data = ?cb.data, "ignoring unrecognised callback");
            return Dispatched::Skipped;
        };

        let posting = cb.message.as_ref().map(Message::posting_ref);
        let outcome = self
            .decisions
            .decide_raw(raw_token, action, posting.as_ref())
            .await;

        if outcome == DecisionOutcome::AlreadyProcessed {
            if let Some(p) = &posting {
                if let Err(e) = self.moderator.finalize(p, ALREADY_PROCESSED).await {
                    debug!(target: "moderation", error = %e, "could not mark stale posting");
                }
            }
        }
        Dispatched::Decision(outcome)
    }
}

/// Long-poll `getUpdates` forever, dispatching updates in arrival order.
pub async fn run_polling(client: Arc<TelegramClient>, dispatcher: UpdateDispatcher) {
    let mut offset: i64 = 0;
    info!(target: "moderation", "update polling started");
    loop {
        let updates = match client.get_updates(offset, LONG_POLL_SECS).await {
            Ok(u) => u,
            Err(e) => {
                warn!(target: "moderation", error = %e, "getUpdates failed; backing off");
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };
        for update in updates {
            offset = offset.max(update.update_id + 1);
            let res = dispatcher.dispatch(&update).await;
            debug!(target: "moderation", update_id = update.update_id, ?res, "update handled");
        }
    }
}
