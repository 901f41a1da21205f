// src/notify/mod.rs
//! Outbound surfaces: the private moderator chat and the public broadcast channel.

pub mod telegram;
pub mod updates;

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use crate::error::SurfaceError;
use crate::store::Token;

/// Opaque reference to a posting on a surface, needed to edit it in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostingRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Where candidates are shown to moderators with approve/reject controls.
#[async_trait]
pub trait ModeratorSurface: Send + Sync {
    /// Post a candidate with two actions bound to `token`.
    async fn post_candidate(
        &self,
        text: &str,
        image_url: Option<&str>,
        token: &Token,
    ) -> Result<PostingRef, SurfaceError>;

    /// Replace the posting's text and remove its controls.
    async fn finalize(&self, posting: &PostingRef, text: &str) -> Result<(), SurfaceError>;

    /// Acknowledge a moderator action so the client stops waiting.
    async fn acknowledge(&self, _callback_id: &str) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Where approved candidates are published.
#[async_trait]
pub trait BroadcastSurface: Send + Sync {
    async fn publish(&self, text: &str, image_url: Option<&str>)
        -> Result<PostingRef, SurfaceError>;

    /// Replace the text (or caption, for image postings) of an earlier publish.
    async fn edit(
        &self,
        posting: &PostingRef,
        text: &str,
        has_image: bool,
    ) -> Result<(), SurfaceError>;
}

/// Log-only surface for dry runs: prints what would be sent and hands back
/// synthetic posting references.
#[derive(Debug, Default)]
pub struct LogSurface {
    next_id: AtomicI64,
}

impl LogSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_ref(&self) -> PostingRef {
        PostingRef {
            chat_id: 0,
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }
}

#[async_trait]
impl ModeratorSurface for LogSurface {
    async fn post_candidate(
        &self,
        text: &str,
        image_url: Option<&str>,
        token: &Token,
    ) -> Result<PostingRef, SurfaceError> {
        let posting = self.next_ref();
        tracing::info!(target: "moderation", %token, image = ?image_url, message_id = posting.message_id, "moderator post:\n{text}");
        Ok(posting)
    }

    async fn finalize(&self, posting: &PostingRef, text: &str) -> Result<(), SurfaceError> {
        tracing::info!(target: "moderation", message_id = posting.message_id, "moderator finalize:\n{text}");
        Ok(())
    }
}

#[async_trait]
impl BroadcastSurface for LogSurface {
    async fn publish(
        &self,
        text: &str,
        image_url: Option<&str>,
    ) -> Result<PostingRef, SurfaceError> {
        let posting = self.next_ref();
        tracing::info!(target: "moderation", image = ?image_url, message_id = posting.message_id, "broadcast:\n{text}");
        Ok(posting)
    }

    async fn edit(
        &self,
        posting: &PostingRef,
        text: &str,
        has_image: bool,
    ) -> Result<(), SurfaceError> {
        tracing::info!(target: "moderation", message_id = posting.message_id, has_image, "broadcast edit:\n{text}");
        Ok(())
    }
}
