// src/config/topic.rs
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::relevance::{RelevanceFilter, DEFAULT_FOREIGN_HOSTS, DEFAULT_TOPIC_KEYWORDS};

pub const ENV_PATH: &str = "TOPIC_CONFIG_PATH";

/// Topic keywords and foreign host snippets. An empty list falls back to the
/// built-in one when turned into a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TopicConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub foreign_hosts: Vec<String>,
}

impl TopicConfig {
    pub fn builtin() -> Self {
        Self {
            keywords: DEFAULT_TOPIC_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            foreign_hosts: DEFAULT_FOREIGN_HOSTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn into_filter(self) -> RelevanceFilter {
        let builtin = Self::builtin();
        let keywords = if self.keywords.is_empty() {
            builtin.keywords
        } else {
            self.keywords
        };
        let hosts = if self.foreign_hosts.is_empty() {
            builtin.foreign_hosts
        } else {
            self.foreign_hosts
        };
        RelevanceFilter::new(hosts, &keywords)
    }
}

/// Load a topic file from an explicit path. TOML or JSON.
pub fn load_topic_from(path: &Path) -> Result<TopicConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_topic(&content, ext.as_str())
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))
}

/// Resolve the topic file:
/// 1) $TOPIC_CONFIG_PATH (must exist)
/// 2) config/topic.toml
/// 3) config/topic.json
/// 4) built-in lists
pub fn load_topic_default() -> Result<TopicConfig, ConfigError> {
    load_topic_with(std::env::var(ENV_PATH).ok())
}

pub(crate) fn load_topic_with(explicit: Option<String>) -> Result<TopicConfig, ConfigError> {
    if let Some(p) = explicit.filter(|p| !p.trim().is_empty()) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_topic_from(&pb);
        }
        return Err(ConfigError::InvalidValue {
            key: ENV_PATH.into(),
            message: format!("{} does not exist", pb.display()),
        });
    }
    let toml_p = PathBuf::from("config/topic.toml");
    if toml_p.exists() {
        return load_topic_from(&toml_p);
    }
    let json_p = PathBuf::from("config/topic.json");
    if json_p.exists() {
        return load_topic_from(&json_p);
    }
    Ok(TopicConfig::builtin())
}

fn parse_topic(s: &str, hint_ext: &str) -> Result<TopicConfig, String> {
    let parsed = if hint_ext == "json" || s.trim_start().starts_with('{') {
        serde_json::from_str::<TopicConfig>(s).map_err(|e| e.to_string())
    } else {
        toml::from_str::<TopicConfig>(s).map_err(|e| e.to_string())
    }?;
    Ok(TopicConfig {
        keywords: clean_list(parsed.keywords),
        foreign_hosts: clean_list(parsed.foreign_hosts),
    })
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_trim_and_formats_work() {
        let toml = r#"
            keywords = [" Kyiv ", "", "Lviv", "Lviv"]
            foreign_hosts = ["bbc."]
        "#;
        let json = r#"{"keywords": ["Odesa", "  Kyiv  ", ""]}"#;
        let t = parse_topic(toml, "toml").unwrap();
        assert_eq!(t.keywords, vec!["Kyiv".to_string(), "Lviv".to_string()]);
        assert_eq!(t.foreign_hosts, vec!["bbc.".to_string()]);
        let j = parse_topic(json, "json").unwrap();
        assert_eq!(j.keywords, vec!["Kyiv".to_string(), "Odesa".to_string()]);
        assert!(j.foreign_hosts.is_empty());
    }

    #[test]
    fn empty_lists_fall_back_to_builtin() {
        let f = TopicConfig::default().into_filter();
        assert!(f.is_relevant("https://www.bbc.com/news/1", "Kyiv update", ""));
        assert!(!f.is_relevant("https://www.bbc.com/news/2", "Weather in Paris", ""));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(parse_topic("keywords = [", "toml").is_err());
    }
}
