// src/ingest/providers/rss.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::ingest::types::{Enclosure, FeedItem, FeedSource};

// Element names are matched on the local part, so `media:content` is
// `content` and `media:thumbnail` is `thumbnail`.

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

/// RSS 1.0: items are siblings of the channel under `rdf:RDF`.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "content", default)]
    media_content: Vec<MediaNode>,
    #[serde(rename = "thumbnail", default)]
    media_thumbnail: Vec<MediaNode>,
    #[serde(rename = "enclosure", default)]
    enclosure: Vec<EnclosureNode>,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnclosureNode {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<TextNode>,
    /// Atom `<content>` (text) and `media:content` (url) share a local name.
    #[serde(rename = "content", default)]
    content: Vec<ContentNode>,
    #[serde(rename = "thumbnail", default)]
    thumbnail: Vec<MediaNode>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ContentNode {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

impl Item {
    fn into_feed_item(self) -> Option<FeedItem> {
        let link = non_empty(self.link)?;
        Some(FeedItem {
            link,
            title: self.title.unwrap_or_default(),
            summary: self.description.unwrap_or_default(),
            media_urls: self.media_content.into_iter().filter_map(|m| m.url).collect(),
            thumbnail_urls: self.media_thumbnail.into_iter().filter_map(|m| m.url).collect(),
            enclosures: self
                .enclosure
                .into_iter()
                .filter_map(|e| {
                    e.url.map(|href| Enclosure {
                        href,
                        mime: e.mime,
                    })
                })
                .collect(),
        })
    }
}

impl Entry {
    fn into_feed_item(self) -> Option<FeedItem> {
        let mut link = None;
        let mut enclosures = Vec::new();
        for l in self.link {
            let Some(href) = non_empty(l.href) else {
                continue;
            };
            match l.rel.as_deref() {
                None | Some("alternate") if link.is_none() => link = Some(href),
                Some("enclosure") => enclosures.push(Enclosure { href, mime: l.mime }),
                _ => {}
            }
        }

        let mut media_urls = Vec::new();
        let mut body = None;
        for c in self.content {
            match c.url {
                Some(url) => media_urls.push(url),
                None if body.is_none() => body = non_empty(c.text),
                None => {}
            }
        }
        let summary = self
            .summary
            .map(|s| s.text)
            .filter(|s| !s.trim().is_empty())
            .or(body)
            .unwrap_or_default();

        Some(FeedItem {
            link: link?,
            title: self.title.map(|t| t.text).unwrap_or_default(),
            summary,
            media_urls,
            thumbnail_urls: self.thumbnail.into_iter().filter_map(|m| m.url).collect(),
            enclosures,
        })
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Local name of the document's root element.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// RSS 2.0, RSS 1.0 or Atom feed, fetched over HTTP or parsed from an
/// in-memory document.
pub struct RssFeedProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        timeout: Duration,
    },
}

impl RssFeedProvider {
    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        Self {
            name: url.clone(),
            mode: Mode::Http {
                url,
                client: reqwest::Client::new(),
                timeout,
            },
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<FeedItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);

        let out: Vec<FeedItem> = match root_element(&xml_clean).as_deref() {
            Some("feed") => {
                let feed: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
                feed.entry.into_iter().filter_map(Entry::into_feed_item).collect()
            }
            Some("RDF") => {
                let rdf: Rdf = from_str(&xml_clean).context("parsing rdf xml")?;
                rdf.item.into_iter().filter_map(Item::into_feed_item).collect()
            }
            _ => {
                let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
                rss.channel.item.into_iter().filter_map(Item::into_feed_item).collect()
            }
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http {
                url,
                client,
                timeout,
            } => {
                let body = client
                    .get(url.as_str())
                    .timeout(*timeout)
                    .send()
                    .await
                    .context("rss http get()")?
                    .error_for_status()
                    .context("rss http status")?
                    .text()
                    .await
                    .context("rss http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// HTML entities that are not valid XML but show up in real feeds.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&laquo;", "\"")
        .replace("&raquo;", "\"")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
