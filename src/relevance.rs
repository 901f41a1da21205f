// src/relevance.rs
//! Relevance gate: native vs foreign source classification and the topic
//! keyword match applied to foreign items.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use url::Url;

/// Host snippets that mark a link as coming from an international outlet.
pub const DEFAULT_FOREIGN_HOSTS: &[&str] = &[
    "bbc.",
    "reuters.",
    "theguardian.",
    "apnews.",
    "cnn.",
    "aljazeera.",
    "nytimes.",
    "dw.com",
    "npr.org",
    "euronews.",
];

/// Topic keywords in Ukrainian, Russian and Latin spellings. Several entries are
/// stems so that inflected forms match as substrings.
pub const DEFAULT_TOPIC_KEYWORDS: &[&str] = &[
    "Україна", "україн", "Київ", "Києв", "Харків", "Львів", "Одеса", "Донбас",
    "Донецьк", "Крим", "Херсон", "Маріуполь", "Запоріжж", "Дніпро", "Зеленськ",
    "Украина", "Киев", "Харьков", "Львов", "Одесса",
    "Ukraine", "Ukrainian", "Kyiv", "Kiev", "Kharkiv", "Lviv", "Odesa", "Donbas",
    "Donetsk", "Crimea", "Kherson", "Mariupol", "Zaporizh", "Dnipro", "Zelensky",
];

static DEFAULT_TOPIC_RE: Lazy<Regex> = Lazy::new(|| {
    build_keyword_regex(DEFAULT_TOPIC_KEYWORDS.iter().copied())
        .expect("default topic keywords compile")
});

/// Where an item comes from, as far as relevance gating is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceClass {
    /// Domestic outlet: always in scope, never translated.
    Native,
    /// International outlet: in scope only on a topic match, translated.
    Foreign,
}

/// Compile keywords into one case-insensitive alternation of literal substrings.
/// Returns `None` when the keyword list is empty.
pub fn build_keyword_regex<'a, I>(keywords: I) -> Option<Regex>
where
    I: IntoIterator<Item = &'a str>,
{
    let alternation = keywords
        .into_iter()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    if alternation.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!("({alternation})"))
        .case_insensitive(true)
        .unicode(true)
        .build()
        .ok()
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    foreign_hosts: Vec<String>,
    topic: Option<Regex>,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self {
            foreign_hosts: DEFAULT_FOREIGN_HOSTS.iter().map(|s| s.to_string()).collect(),
            topic: Some(DEFAULT_TOPIC_RE.clone()),
        }
    }
}

impl RelevanceFilter {
    /// Build a filter from configured lists. An empty keyword list means no
    /// foreign item is ever relevant.
    pub fn new(foreign_hosts: Vec<String>, keywords: &[String]) -> Self {
        Self {
            foreign_hosts: foreign_hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            topic: build_keyword_regex(keywords.iter().map(String::as_str)),
        }
    }

    /// Classify a link by its host. Links without a parseable host are native.
    pub fn classify(&self, link: &str) -> SourceClass {
        let host = match Url::parse(link.trim()) {
            Ok(u) => u.host_str().map(|h| h.to_ascii_lowercase()),
            Err(_) => None,
        };
        match host {
            Some(h) if self.foreign_hosts.iter().any(|snip| h.contains(snip.as_str())) => {
                SourceClass::Foreign
            }
            _ => SourceClass::Native,
        }
    }

    /// True if title or summary mentions the topic in any supported script.
    pub fn matches_topic(&self, title: &str, summary: &str) -> bool {
        let Some(re) = &self.topic else {
            return false;
        };
        re.is_match(&format!("{title} {summary}"))
    }

    /// Full gate: native items always pass, foreign items need a topic match.
    pub fn is_relevant(&self, link: &str, title: &str, summary: &str) -> bool {
        match self.classify(link) {
            SourceClass::Native => true,
            SourceClass::Foreign => self.matches_topic(title, summary),
        }
    }
}
