// src/edits.rs
//! Moderator edits: stored as the candidate's override text and, for already
//! published candidates, pushed to the broadcast posting.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::compose::{broadcast_text, strip_status_annotation, BroadcastLimits};
use crate::notify::{BroadcastSurface, PostingRef};
use crate::store::{CandidateStatus, SharedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The posting is not (or no longer) tracked.
    Untracked,
    /// Edit carried no text; nothing changed.
    Ignored,
    /// Stored as override text; nothing published yet.
    Stored,
    /// Stored and applied to the broadcast posting.
    Propagated,
    /// Stored, but the broadcast edit failed and was dropped.
    PropagationFailed,
}

pub struct EditPropagator {
    store: SharedStore,
    broadcast: Arc<dyn BroadcastSurface>,
    limits: BroadcastLimits,
}

impl EditPropagator {
    pub fn new(store: SharedStore, broadcast: Arc<dyn BroadcastSurface>) -> Self {
        crate::telemetry::ensure_described();
        Self {
            store,
            broadcast,
            limits: BroadcastLimits::default(),
        }
    }

    pub async fn on_moderator_edit(&self, posting: &PostingRef, new_text: &str) -> EditOutcome {
        let text = strip_status_annotation(new_text);
        if text.is_empty() {
            return EditOutcome::Ignored;
        }

        let mut store = self.store.lock().await;
        let Some(token) = store.token_for_posting(posting) else {
            debug!(target: "moderation", message_id = posting.message_id, "edit on untracked posting");
            return EditOutcome::Untracked;
        };
        let Some(candidate) = store.record_edit(&token, text) else {
            return EditOutcome::Untracked;
        };
        counter!("moderation_edits_total").increment(1);
        info!(target: "moderation", %token, status = %candidate.status, "moderator edit stored");

        let (CandidateStatus::Approved, Some(broadcast_ref)) =
            (candidate.status, candidate.broadcast_ref.as_ref())
        else {
            return EditOutcome::Stored;
        };

        let body = broadcast_text(
            text,
            &candidate.source_link,
            candidate.has_image(),
            &self.limits,
        );
        // Still under the store lock so no decision or edit interleaves on this token.
        match self
            .broadcast
            .edit(broadcast_ref, &body, candidate.has_image())
            .await
        {
            Ok(()) => EditOutcome::Propagated,
            Err(e) => {
                warn!(target: "moderation", %token, error = %e, "broadcast edit failed");
                EditOutcome::PropagationFailed
            }
        }
    }
}
