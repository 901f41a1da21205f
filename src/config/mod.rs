// src/config/mod.rs
//! Startup configuration. Everything comes from the environment (a `.env` file
//! is loaded by the binary); the topic lists come from a separate file.

pub mod topic;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::ingest::DEFAULT_ITEMS_PER_SOURCE;
use crate::store::RetentionPolicy;

pub use topic::{load_topic_default, load_topic_from, TopicConfig};

const DEFAULT_LIBRETRANSLATE_URL: &str = "https://libretranslate.com";

#[derive(Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub moderator_chat_id: i64,
    pub broadcast_chat_id: i64,
    pub sources: Vec<String>,
    pub poll_interval: Duration,
    pub first_poll_delay: Duration,
    pub items_per_source: usize,
    pub translate_target: String,
    pub libretranslate_url: String,
    pub libretranslate_api_key: Option<String>,
    pub native_summary_budget: Option<usize>,
    pub retention: RetentionPolicy,
    pub edit_propagation: bool,
    pub scrape_og_image: bool,
    pub outbound_timeout: Duration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_token", &"<redacted>")
            .field("moderator_chat_id", &self.moderator_chat_id)
            .field("broadcast_chat_id", &self.broadcast_chat_id)
            .field("sources", &self.sources)
            .field("poll_interval", &self.poll_interval)
            .field("first_poll_delay", &self.first_poll_delay)
            .field("items_per_source", &self.items_per_source)
            .field("translate_target", &self.translate_target)
            .field("libretranslate_url", &self.libretranslate_url)
            .field("native_summary_budget", &self.native_summary_budget)
            .field("retention", &self.retention)
            .field("edit_propagation", &self.edit_propagation)
            .field("scrape_og_image", &self.scrape_og_image)
            .field("outbound_timeout", &self.outbound_timeout)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |k: &str| get(k).ok_or_else(|| ConfigError::MissingEnvVar(k.to_string()));

        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let moderator_chat_id = parse_value("VALIDATION_CHANNEL_ID", &required("VALIDATION_CHANNEL_ID")?)?;
        let broadcast_chat_id = parse_value("MAIN_CHANNEL_ID", &required("MAIN_CHANNEL_ID")?)?;

        let sources = get("SOURCES")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let secs = |k: &str, default: u64| -> Result<Duration, ConfigError> {
            Ok(Duration::from_secs(optional(get(k), k, default)?))
        };

        let items_per_source: usize =
            optional(get("ITEMS_PER_SOURCE"), "ITEMS_PER_SOURCE", DEFAULT_ITEMS_PER_SOURCE)?;
        if items_per_source == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ITEMS_PER_SOURCE".into(),
                message: "must be at least 1".into(),
            });
        }

        let poll_interval = secs("POLL_INTERVAL_SECS", 600)?;
        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "POLL_INTERVAL_SECS".into(),
                message: "must be positive".into(),
            });
        }

        let native_summary_budget = match get("NATIVE_SUMMARY_BUDGET") {
            Some(v) => Some(parse_value::<usize>("NATIVE_SUMMARY_BUDGET", &v)?),
            None => None,
        };

        let retention = if optional(get("RETAIN_DECIDED"), "RETAIN_DECIDED", true)? {
            RetentionPolicy::RetainDecided
        } else {
            RetentionPolicy::DropDecided
        };

        Ok(Self {
            bot_token,
            moderator_chat_id,
            broadcast_chat_id,
            sources,
            poll_interval,
            first_poll_delay: secs("FIRST_POLL_DELAY_SECS", 5)?,
            items_per_source,
            translate_target: get("TRANSLATE_TARGET").unwrap_or_else(|| "uk".to_string()),
            libretranslate_url: get("LIBRETRANSLATE_URL")
                .unwrap_or_else(|| DEFAULT_LIBRETRANSLATE_URL.to_string()),
            libretranslate_api_key: get("LIBRETRANSLATE_API_KEY"),
            native_summary_budget,
            retention,
            edit_propagation: optional(get("EDIT_PROPAGATION"), "EDIT_PROPAGATION", true)?,
            scrape_og_image: optional(get("SCRAPE_OG_IMAGE"), "SCRAPE_OG_IMAGE", true)?,
            outbound_timeout: secs("OUTBOUND_TIMEOUT_SECS", 10)?,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

fn optional<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}
