// src/compose.rs
//! Message composition for the moderator and broadcast surfaces, plus the
//! length-fitting policy shared by every outbound text.

use crate::ingest::normalize_text;
use crate::ingest::types::FeedItem;
use crate::relevance::{RelevanceFilter, SourceClass};
use crate::store::CandidateStatus;
use crate::translate::Translator;

/// Text-only message limit of the chat platform.
pub const TEXT_MESSAGE_LIMIT: usize = 4096;
/// Photo caption limit of the chat platform.
pub const PHOTO_CAPTION_LIMIT: usize = 1024;
/// Foreign summaries are cut to this many characters before translation.
pub const FOREIGN_BRIEF_CHARS: usize = 300;

const ELLIPSIS: &str = "...";
const FOREIGN_MARKER: &str = "🇺🇦";

pub const STATUS_APPROVED: &str = "✅ Опубліковано";
pub const STATUS_REJECTED: &str = "❌ Відхилено";
pub const ALREADY_PROCESSED: &str = "Цей запис вже опрацьовано.";

/// Line appended to every broadcast, after any truncation.
pub fn source_line(link: &str) -> String {
    format!("\n\n🔗 Джерело: {link}")
}

/// Fit `text + suffix` into `budget` characters. When the text does not fit it
/// is cut at `budget - len(suffix) - 3` and followed by `...`, then the suffix.
/// A suffix too long to leave room for the ellipsis is cut together with the
/// text instead. The result never exceeds `budget`.
pub fn fit_with_suffix(text: &str, suffix: &str, budget: usize) -> String {
    let suffix_len = suffix.chars().count();
    let text_len = text.chars().count();
    if text_len + suffix_len <= budget {
        return format!("{text}{suffix}");
    }
    if suffix_len + ELLIPSIS.len() > budget {
        if suffix.is_empty() {
            return text.chars().take(budget).collect();
        }
        return fit_with_suffix(&format!("{text}{suffix}"), "", budget);
    }
    let keep = budget - suffix_len - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out.push_str(suffix);
    out
}

/// Cut `text` to at most `budget` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, budget: usize) -> String {
    fit_with_suffix(text, "", budget)
}

/// Per-surface length budgets for broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastLimits {
    pub text: usize,
    pub caption: usize,
}

impl Default for BroadcastLimits {
    fn default() -> Self {
        Self {
            text: TEXT_MESSAGE_LIMIT,
            caption: PHOTO_CAPTION_LIMIT,
        }
    }
}

impl BroadcastLimits {
    /// A photo caption is stricter than a text message.
    pub fn budget(&self, has_image: bool) -> usize {
        if has_image {
            self.caption
        } else {
            self.text
        }
    }
}

/// Final public text: body fitted to the binding budget, then the source line.
pub fn broadcast_text(
    body: &str,
    source_link: &str,
    has_image: bool,
    limits: &BroadcastLimits,
) -> String {
    fit_with_suffix(body, &source_line(source_link), limits.budget(has_image))
}

pub fn status_annotation(status: CandidateStatus) -> Option<&'static str> {
    match status {
        CandidateStatus::Pending => None,
        CandidateStatus::Approved => Some(STATUS_APPROVED),
        CandidateStatus::Rejected => Some(STATUS_REJECTED),
    }
}

/// Moderator posting after a decision: stored text plus the terminal status.
pub fn moderator_final_text(body: &str, status: CandidateStatus) -> String {
    match status_annotation(status) {
        Some(s) => fit_with_suffix(body, &format!("\n\n{s}"), TEXT_MESSAGE_LIMIT),
        None => truncate_chars(body, TEXT_MESSAGE_LIMIT),
    }
}

/// Drop a trailing status annotation that a moderator edit may carry over.
pub fn strip_status_annotation(text: &str) -> &str {
    let trimmed = text.trim_end();
    for s in [STATUS_APPROVED, STATUS_REJECTED] {
        if let Some(rest) = trimmed.strip_suffix(s) {
            return rest.trim_end();
        }
    }
    trimmed
}

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub target_language: String,
    /// Optional readability cap for native summaries, in characters.
    pub native_summary_budget: Option<usize>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            target_language: "uk".to_string(),
            native_summary_budget: None,
        }
    }
}

/// Composed moderator-facing text for one feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub text: String,
    pub class: SourceClass,
}

pub struct Composer {
    filter: RelevanceFilter,
    translator: Translator,
    cfg: ComposerConfig,
}

impl Composer {
    pub fn new(filter: RelevanceFilter, translator: Translator, cfg: ComposerConfig) -> Self {
        Self {
            filter,
            translator,
            cfg,
        }
    }

    /// Compose the moderator text. `None` means the item is out of scope and
    /// must be discarded.
    pub async fn compose(&self, item: &FeedItem) -> Option<ComposedMessage> {
        let title = normalize_text(&item.title);
        let summary = normalize_text(&item.summary);

        match self.filter.classify(&item.link) {
            SourceClass::Native => Some(ComposedMessage {
                text: self.compose_native(&item.link, &title, &summary),
                class: SourceClass::Native,
            }),
            SourceClass::Foreign => {
                if !self.filter.matches_topic(&item.title, &item.summary) {
                    return None;
                }
                Some(ComposedMessage {
                    text: self.compose_foreign(&item.link, &title, &summary).await,
                    class: SourceClass::Foreign,
                })
            }
        }
    }

    fn compose_native(&self, link: &str, title: &str, summary: &str) -> String {
        let mut lines = Vec::with_capacity(2);
        if !title.is_empty() {
            lines.push(format!("*{title}*"));
        }
        if !summary.is_empty() {
            lines.push(match self.cfg.native_summary_budget {
                Some(budget) => truncate_chars(summary, budget),
                None => summary.to_string(),
            });
        }
        let body = lines.join("\n");
        let read_more = format!("[Читати джерело]({link})");
        if body.is_empty() {
            read_more
        } else {
            fit_with_suffix(&body, &format!("\n\n{read_more}"), TEXT_MESSAGE_LIMIT)
        }
    }

    async fn compose_foreign(&self, link: &str, title: &str, summary: &str) -> String {
        let target = self.cfg.target_language.as_str();
        let brief: String = summary.chars().take(FOREIGN_BRIEF_CHARS).collect();
        let translated_title = self.translator.translate(title, target).await;
        let translated_brief = self.translator.translate(&brief, target).await;

        let mut lines = vec![format!("{FOREIGN_MARKER} *{translated_title}*")];
        if !translated_brief.is_empty() {
            lines.push(translated_brief);
        }
        fit_with_suffix(
            &lines.join("\n"),
            &format!("\n🔗 Джерело: {link}"),
            TEXT_MESSAGE_LIMIT,
        )
    }
}
