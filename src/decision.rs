// src/decision.rs
//! Decision handler: resolves a moderator approve/reject action against the
//! store, broadcasts on approval and finalizes the moderator posting.

use std::str::FromStr;
use std::sync::Arc;

use metrics::counter;
use tracing::{error, info, warn};

use crate::compose::{broadcast_text, moderator_final_text, BroadcastLimits};
use crate::notify::{BroadcastSurface, ModeratorSurface, PostingRef};
use crate::store::{CandidateStatus, SharedStore, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for ModerationAction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(format!("Unknown moderation action: {other}")),
        }
    }
}

/// Callback payload bound to a moderator button: `<action>:<token>`.
pub fn callback_data(action: ModerationAction, token: &Token) -> String {
    format!("{}:{}", action.as_str(), token)
}

/// Split a callback payload into action and raw token. Unknown actions and
/// payloads without a separator yield `None`.
pub fn parse_callback_data(data: &str) -> Option<(ModerationAction, &str)> {
    let (action, token) = data.split_once(':')?;
    let action = action.parse().ok()?;
    Some((action, token))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    Approved { broadcast: PostingRef },
    Rejected,
    /// Token unknown, stale, forged or already decided. Nothing changed.
    AlreadyProcessed,
    /// Publishing failed; the candidate is still pending.
    BroadcastFailed,
}

pub struct DecisionHandler {
    store: SharedStore,
    moderator: Arc<dyn ModeratorSurface>,
    broadcast: Arc<dyn BroadcastSurface>,
    limits: BroadcastLimits,
}

impl DecisionHandler {
    pub fn new(
        store: SharedStore,
        moderator: Arc<dyn ModeratorSurface>,
        broadcast: Arc<dyn BroadcastSurface>,
    ) -> Self {
        crate::telemetry::ensure_described();
        Self {
            store,
            moderator,
            broadcast,
            limits: BroadcastLimits::default(),
        }
    }

    /// Like [`decide`](Self::decide) but takes the token as received on the wire.
    pub async fn decide_raw(
        &self,
        raw_token: &str,
        action: ModerationAction,
        moderator_posting: Option<&PostingRef>,
    ) -> DecisionOutcome {
        match Token::parse(raw_token) {
            Some(token) => self.decide(&token, action, moderator_posting).await,
            None => {
                warn!(target: "moderation", raw_token, "malformed decision token");
                DecisionOutcome::AlreadyProcessed
            }
        }
    }

    /// Apply a moderator action. `moderator_posting` is the posting the action
    /// came from; the stored reference is used when absent.
    pub async fn decide(
        &self,
        token: &Token,
        action: ModerationAction,
        moderator_posting: Option<&PostingRef>,
    ) -> DecisionOutcome {
        let mut store = self.store.lock().await;

        let Some(candidate) = store.pending(token).cloned() else {
            info!(target: "moderation", %token, action = action.as_str(), "decision on unknown or decided token");
            counter!("moderation_decisions_total", "action" => "already_processed").increment(1);
            return DecisionOutcome::AlreadyProcessed;
        };

        let body = candidate.current_text().to_string();

        let (status, outcome) = match action {
            ModerationAction::Approve => {
                let text = broadcast_text(
                    &body,
                    &candidate.source_link,
                    candidate.has_image(),
                    &self.limits,
                );
                let posted = match self
                    .broadcast
                    .publish(&text, candidate.image_url.as_deref())
                    .await
                {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(target: "moderation", %token, error = %e, link = %candidate.source_link, "broadcast failed; candidate stays pending");
                        counter!("moderation_broadcast_errors_total").increment(1);
                        return DecisionOutcome::BroadcastFailed;
                    }
                };
                if let Err(e) = store.approve(token, posted.clone()) {
                    error!(target: "moderation", %token, error = %e, "approve after publish failed");
                    return DecisionOutcome::AlreadyProcessed;
                }
                (
                    CandidateStatus::Approved,
                    DecisionOutcome::Approved { broadcast: posted },
                )
            }
            ModerationAction::Reject => {
                if let Err(e) = store.reject(token) {
                    error!(target: "moderation", %token, error = %e, "reject failed");
                    return DecisionOutcome::AlreadyProcessed;
                }
                (CandidateStatus::Rejected, DecisionOutcome::Rejected)
            }
        };
        drop(store);

        counter!("moderation_decisions_total", "action" => action.as_str()).increment(1);

        let target = moderator_posting
            .cloned()
            .or_else(|| candidate.moderator_ref.clone());
        if let Some(posting) = target {
            let final_text = moderator_final_text(&body, status);
            if let Err(e) = self.moderator.finalize(&posting, &final_text).await {
                warn!(target: "moderation", %token, error = %e, "could not finalize moderator posting");
            }
        }

        outcome
    }
}
