// src/ingest/types.rs
use anyhow::Result;

/// Enclosure link attached to a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enclosure {
    pub href: String,
    pub mime: Option<String>, // declared MIME type, e.g. "image/jpeg"
}

/// One item as read from a feed. Ephemeral: read once per poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedItem {
    pub link: String,
    pub title: String,
    pub summary: String, // may be empty or contain markup
    pub media_urls: Vec<String>,
    pub thumbnail_urls: Vec<String>,
    pub enclosures: Vec<Enclosure>,
}

impl FeedItem {
    pub fn new(link: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            summary: summary.into(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Items in feed order, newest first as published by the feed.
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>>;
    fn name(&self) -> &str;
}
