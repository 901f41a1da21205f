// tests/common/mod.rs
// Shared recording doubles for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use feed_moderator::error::{SurfaceError, TranslateError};
use feed_moderator::ingest::types::{FeedItem, FeedSource};
use feed_moderator::notify::{BroadcastSurface, ModeratorSurface, PostingRef};
use feed_moderator::store::Token;
use feed_moderator::translate::TranslationProvider;

pub const MODERATOR_CHAT: i64 = -100;
pub const BROADCAST_CHAT: i64 = -200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub posting: PostingRef,
    pub text: String,
    pub image_url: Option<String>,
    pub token: Option<Token>,
}

/// Moderator surface that records every call.
#[derive(Default)]
pub struct RecordingModerator {
    next_id: AtomicI64,
    pub fail_posts: bool,
    pub posts: Mutex<Vec<Posted>>,
    pub finalized: Mutex<Vec<(PostingRef, String)>>,
    pub acks: Mutex<Vec<String>>,
}

impl RecordingModerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_posts: true,
            ..Self::default()
        })
    }

    pub fn last_post(&self) -> Posted {
        self.posts.lock().last().cloned().expect("no moderator post")
    }
}

#[async_trait]
impl ModeratorSurface for RecordingModerator {
    async fn post_candidate(
        &self,
        text: &str,
        image_url: Option<&str>,
        token: &Token,
    ) -> Result<PostingRef, SurfaceError> {
        if self.fail_posts {
            return Err(SurfaceError::Api {
                method: "sendMessage".into(),
                description: "Bad Request: chat not found".into(),
            });
        }
        let posting = PostingRef {
            chat_id: MODERATOR_CHAT,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.posts.lock().push(Posted {
            posting: posting.clone(),
            text: text.to_string(),
            image_url: image_url.map(str::to_string),
            token: Some(*token),
        });
        Ok(posting)
    }

    async fn finalize(&self, posting: &PostingRef, text: &str) -> Result<(), SurfaceError> {
        self.finalized.lock().push((posting.clone(), text.to_string()));
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), SurfaceError> {
        self.acks.lock().push(callback_id.to_string());
        Ok(())
    }
}

/// Broadcast surface that records publishes and edits; optionally fails.
#[derive(Default)]
pub struct RecordingBroadcaster {
    next_id: AtomicI64,
    pub fail: Mutex<bool>,
    pub published: Mutex<Vec<Posted>>,
    pub edits: Mutex<Vec<(PostingRef, String, bool)>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let b = Self::default();
        *b.fail.lock() = true;
        Arc::new(b)
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    fn error(method: &str) -> SurfaceError {
        SurfaceError::Http {
            method: method.into(),
            reason: "connection reset".into(),
        }
    }
}

#[async_trait]
impl BroadcastSurface for RecordingBroadcaster {
    async fn publish(
        &self,
        text: &str,
        image_url: Option<&str>,
    ) -> Result<PostingRef, SurfaceError> {
        if *self.fail.lock() {
            return Err(Self::error("sendMessage"));
        }
        let posting = PostingRef {
            chat_id: BROADCAST_CHAT,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.published.lock().push(Posted {
            posting: posting.clone(),
            text: text.to_string(),
            image_url: image_url.map(str::to_string),
            token: None,
        });
        Ok(posting)
    }

    async fn edit(
        &self,
        posting: &PostingRef,
        text: &str,
        has_image: bool,
    ) -> Result<(), SurfaceError> {
        if *self.fail.lock() {
            return Err(Self::error("editMessageText"));
        }
        self.edits
            .lock()
            .push((posting.clone(), text.to_string(), has_image));
        Ok(())
    }
}

/// Feed source returning a fixed list, or an error.
pub struct StaticFeed {
    pub name: String,
    pub items: Vec<FeedItem>,
    pub fail: bool,
}

impl StaticFeed {
    pub fn boxed(items: Vec<FeedItem>) -> Box<dyn FeedSource> {
        Box::new(Self {
            name: "static".into(),
            items,
            fail: false,
        })
    }

    pub fn broken() -> Box<dyn FeedSource> {
        Box::new(Self {
            name: "broken".into(),
            items: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_latest(&self) -> anyhow::Result<Vec<FeedItem>> {
        if self.fail {
            anyhow::bail!("feed unreachable");
        }
        Ok(self.items.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Translation provider that prefixes its input and counts calls.
pub struct StubProvider {
    pub prefix: &'static str,
    pub calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(prefix: &'static str) -> Arc<Self> {
        Arc::new(Self {
            prefix,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for StubProvider {
    async fn translate(&self, text: &str, _target: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}{}", self.prefix, text))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Translation provider that always fails.
#[derive(Default)]
pub struct FailingProvider {
    pub calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for FailingProvider {
    async fn translate(&self, _text: &str, _target: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TranslateError::RequestFailed {
            provider: "failing".into(),
            reason: "503 Service Unavailable".into(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub fn native_item(link: &str, title: &str, summary: &str) -> FeedItem {
    FeedItem::new(link, title, summary)
}
