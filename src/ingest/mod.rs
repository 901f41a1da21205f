// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use std::collections::HashSet;
use std::sync::Arc;

use metrics::counter;
use once_cell::sync::OnceCell;

use crate::canonical::canonicalize;
use crate::compose::Composer;
use crate::image::ImageResolver;
use crate::ingest::types::{FeedItem, FeedSource};
use crate::notify::ModeratorSurface;
use crate::store::{Candidate, SharedStore, Token};

/// Default number of items taken from each source per cycle.
pub const DEFAULT_ITEMS_PER_SOURCE: usize = 5;

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Canonical keys admitted into the pipeline. Append-only for the process
/// lifetime, so rejected and irrelevant items are never reconsidered.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    keys: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as seen. Returns false if it was already present.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Counters for one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub considered: usize,
    pub duplicates: usize,
    pub discarded: usize,
    pub registered: usize,
    pub failed: usize,
}

/// Pulls feeds, deduplicates, filters, composes and registers candidates.
pub struct Ingestor {
    sources: Vec<Box<dyn FeedSource>>,
    items_per_source: usize,
    seen: SeenSet,
    composer: Composer,
    images: ImageResolver,
    store: SharedStore,
    moderator: Arc<dyn ModeratorSurface>,
}

impl Ingestor {
    pub fn new(
        sources: Vec<Box<dyn FeedSource>>,
        composer: Composer,
        images: ImageResolver,
        store: SharedStore,
        moderator: Arc<dyn ModeratorSurface>,
    ) -> Self {
        Self {
            sources,
            items_per_source: DEFAULT_ITEMS_PER_SOURCE,
            seen: SeenSet::new(),
            composer,
            images,
            store,
            moderator,
        }
    }

    pub fn with_items_per_source(mut self, cap: usize) -> Self {
        self.items_per_source = cap;
        self
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Run one cycle over every source. Source and per-item failures are
    /// logged and skipped; they never abort the cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        crate::telemetry::ensure_described();
        let mut report = CycleReport::default();

        for idx in 0..self.sources.len() {
            let fetched = self.sources[idx].fetch_latest().await;
            let items = match fetched {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, source = self.sources[idx].name(), "source error");
                    counter!("ingest_source_errors_total").increment(1);
                    continue;
                }
            };
            for item in items.into_iter().take(self.items_per_source) {
                self.process_item(item, &mut report).await;
            }
        }

        counter!("ingest_items_total").increment(report.considered as u64);
        counter!("ingest_duplicates_total").increment(report.duplicates as u64);
        counter!("ingest_discarded_total").increment(report.discarded as u64);
        counter!("ingest_candidates_total").increment(report.registered as u64);

        report
    }

    async fn process_item(&mut self, item: FeedItem, report: &mut CycleReport) {
        report.considered += 1;

        let key = canonicalize(&item.link);
        if !self.seen.insert(&key) {
            report.duplicates += 1;
            return;
        }

        let Some(message) = self.composer.compose(&item).await else {
            tracing::debug!(target: "ingest", link = %item.link, "foreign item off-topic, discarded");
            report.discarded += 1;
            return;
        };

        let image_url = self.images.resolve(&item).await;
        let token = Token::new();
        let candidate = Candidate::new(
            token,
            message.text.clone(),
            image_url.clone(),
            key,
            item.link.clone(),
        );

        // Registered before posting so a fast moderator click always finds it.
        if let Err(e) = self.store.lock().await.register(candidate) {
            tracing::error!(target: "ingest", error = %e, "token invariant violated; item skipped");
            report.failed += 1;
            return;
        }

        match self
            .moderator
            .post_candidate(&message.text, image_url.as_deref(), &token)
            .await
        {
            Ok(posting) => {
                self.store.lock().await.attach_moderator_ref(&token, posting);
                tracing::info!(target: "ingest", %token, link = %item.link, class = ?message.class, "candidate sent to moderation");
                report.registered += 1;
            }
            Err(e) => {
                tracing::warn!(target: "ingest", %token, error = %e, link = %item.link, "moderator post failed; candidate dropped");
                counter!("ingest_source_errors_total").increment(1);
                self.store.lock().await.discard(&token);
                report.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_markup_and_collapses_ws() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>!</p>\n\n ";
        assert_eq!(normalize_text(s), "Hello, world !");
    }

    #[test]
    fn normalize_keeps_sentence_punctuation() {
        assert_eq!(normalize_text("Done."), "Done.");
    }

    #[test]
    fn seen_set_is_append_only() {
        let mut seen = SeenSet::new();
        assert!(seen.insert("https://a.test/"));
        assert!(!seen.insert("https://a.test/"));
        assert!(seen.contains("https://a.test/"));
        assert_eq!(seen.len(), 1);
    }
}
