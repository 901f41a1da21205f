// src/translate.rs
//! Best-effort translation: ordered provider fallback with pass-through on failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use serde::Deserialize;

use crate::error::TranslateError;

/// A single remote translation backend. May fail.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;
    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn TranslationProvider>;

/// Tries providers in order and returns the input unchanged when all fail.
#[derive(Clone, Default)]
pub struct Translator {
    providers: Vec<DynProvider>,
}

impl Translator {
    pub fn new(providers: Vec<DynProvider>) -> Self {
        crate::telemetry::ensure_described();
        Self { providers }
    }

    /// LibreTranslate first, Google second.
    pub fn with_defaults(libre_url: &str, libre_api_key: Option<String>, timeout: Duration) -> Self {
        Self::new(vec![
            Arc::new(LibreTranslateProvider::new(libre_url, libre_api_key, timeout)),
            Arc::new(GoogleTranslateProvider::new(timeout)),
        ])
    }

    /// A translator with no providers: every call is a pass-through.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn translate(&self, text: &str, target: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        for p in &self.providers {
            match p.translate(text, target).await {
                Ok(out) => return out,
                Err(e) => {
                    tracing::warn!(target: "ingest", provider = p.name(), error = %e, "translation failed, trying next provider");
                    counter!("translate_fallbacks_total", "provider" => p.name()).increment(1);
                }
            }
        }
        if !self.providers.is_empty() {
            tracing::warn!(target: "ingest", "all translation providers failed; passing text through");
        }
        text.to_string()
    }
}

// ------------------------------------------------------------
// LibreTranslate
// ------------------------------------------------------------

pub struct LibreTranslateProvider {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
    timeout: Duration,
}

#[derive(Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

impl LibreTranslateProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            endpoint: format!("{}/translate", base_url.trim_end_matches('/')),
            api_key,
            client: Client::new(),
            timeout,
        }
    }

    fn fail(reason: impl ToString) -> TranslateError {
        TranslateError::RequestFailed {
            provider: "libretranslate".into(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateProvider {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let mut body = serde_json::json!({
            "q": text,
            "source": "auto",
            "target": target,
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            body["api_key"] = serde_json::Value::String(key.clone());
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(Self::fail)?
            .error_for_status()
            .map_err(Self::fail)?;

        let parsed: LibreResponse = resp.json().await.map_err(|e| TranslateError::InvalidResponse {
            provider: "libretranslate".into(),
            reason: e.to_string(),
        })?;

        match (parsed.translated_text, parsed.error) {
            (Some(t), _) if !t.is_empty() => Ok(t),
            (_, Some(err)) => Err(Self::fail(err)),
            _ => Err(TranslateError::InvalidResponse {
                provider: "libretranslate".into(),
                reason: "missing translatedText".into(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "libretranslate"
    }
}

// ------------------------------------------------------------
// Google (public gtx endpoint)
// ------------------------------------------------------------

const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleTranslateProvider {
    client: Client,
    timeout: Duration,
}

impl GoogleTranslateProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

/// Join the translated segments of a `translate_a/single` response:
/// `[[["segment", "source", ...], ...], ...]`.
pub(crate) fn parse_gtx_segments(v: &serde_json::Value) -> Option<String> {
    let segments = v.get(0)?.as_array()?;
    let out: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
        .collect();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let fail = |reason: String| TranslateError::RequestFailed {
            provider: "google".into(),
            reason,
        };

        let resp = self
            .client
            .get(GOOGLE_ENDPOINT)
            .timeout(self.timeout)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?
            .error_for_status()
            .map_err(|e| fail(e.to_string()))?;

        let v: serde_json::Value = resp.json().await.map_err(|e| TranslateError::InvalidResponse {
            provider: "google".into(),
            reason: e.to_string(),
        })?;

        parse_gtx_segments(&v).ok_or_else(|| TranslateError::InvalidResponse {
            provider: "google".into(),
            reason: "no translated segments".into(),
        })
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gtx_segments_are_concatenated() {
        let v = serde_json::json!([
            [["Привіт. ", "Hello. ", null], ["Світ", "World", null]],
            null,
            "en"
        ]);
        assert_eq!(parse_gtx_segments(&v).as_deref(), Some("Привіт. Світ"));
    }

    #[test]
    fn gtx_garbage_yields_none() {
        assert!(parse_gtx_segments(&serde_json::json!({"x": 1})).is_none());
        assert!(parse_gtx_segments(&serde_json::json!([[]])).is_none());
    }

    #[tokio::test]
    async fn disabled_translator_passes_through() {
        let t = Translator::disabled();
        assert_eq!(t.translate("hello", "uk").await, "hello");
        assert_eq!(t.translate("", "uk").await, "");
    }
}
