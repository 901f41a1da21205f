// src/image.rs
//! Representative image lookup. Absence of an image is a normal outcome.

use std::time::Duration;

use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Client;

use crate::ingest::types::FeedItem;

/// Steps that need no network: media attachment, thumbnail, image enclosure.
pub fn image_from_item(item: &FeedItem) -> Option<String> {
    let first_non_empty = |urls: &[String]| urls.iter().find(|u| !u.trim().is_empty()).cloned();

    first_non_empty(&item.media_urls)
        .or_else(|| first_non_empty(&item.thumbnail_urls))
        .or_else(|| {
            item.enclosures
                .iter()
                .find(|e| {
                    e.mime
                        .as_deref()
                        .is_some_and(|m| m.to_ascii_lowercase().starts_with("image/"))
                        && !e.href.trim().is_empty()
                })
                .map(|e| e.href.clone())
        })
}

/// Find an Open Graph image in article HTML. Handles both attribute orders.
pub fn extract_og_image(html: &str) -> Option<String> {
    static RE_PROP_FIRST: OnceCell<Regex> = OnceCell::new();
    static RE_CONTENT_FIRST: OnceCell<Regex> = OnceCell::new();
    let prop_first = RE_PROP_FIRST.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]+property\s*=\s*["']og:image["'][^>]*content\s*=\s*["']([^"']+)["']"#)
            .unwrap()
    });
    let content_first = RE_CONTENT_FIRST.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]+content\s*=\s*["']([^"']+)["'][^>]*property\s*=\s*["']og:image["']"#)
            .unwrap()
    });

    prop_first
        .captures(html)
        .or_else(|| content_first.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str().trim()).to_string())
        .filter(|s| !s.is_empty())
}

pub struct ImageResolver {
    client: Client,
    timeout: Duration,
    scrape: bool,
}

impl ImageResolver {
    pub fn new(scrape: bool, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
            scrape,
        }
    }

    /// Resolver that never touches the network.
    pub fn offline() -> Self {
        Self::new(false, Duration::from_secs(0))
    }

    pub async fn resolve(&self, item: &FeedItem) -> Option<String> {
        if let Some(url) = image_from_item(item) {
            return Some(url);
        }
        if !self.scrape || item.link.is_empty() {
            return None;
        }
        match self.fetch_og_image(&item.link).await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(target: "ingest", error = %e, link = %item.link, "og:image lookup failed");
                None
            }
        }
    }

    async fn fetch_og_image(&self, link: &str) -> Result<Option<String>, reqwest::Error> {
        let html = self
            .client
            .get(link)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(extract_og_image(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_image_property_first() {
        let html = r#"<head><meta property="og:image" content="https://cdn.test/a.jpg?x=1&amp;y=2"></head>"#;
        assert_eq!(
            extract_og_image(html).as_deref(),
            Some("https://cdn.test/a.jpg?x=1&y=2")
        );
    }

    #[test]
    fn og_image_content_first() {
        let html = r#"<meta content='https://cdn.test/b.png' property='og:image' />"#;
        assert_eq!(extract_og_image(html).as_deref(), Some("https://cdn.test/b.png"));
    }

    #[test]
    fn no_og_image() {
        assert!(extract_og_image("<html><meta name=\"twitter:card\"></html>").is_none());
    }
}
