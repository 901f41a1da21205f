// src/store.rs
//! In-memory moderation registry: candidates keyed by an opaque token, with a
//! one-way `pending -> approved | rejected` state machine.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ModerationError;
use crate::notify::PostingRef;

/// Opaque correlation id between a moderator posting and its candidate.
/// Random, never reused, carries no information about the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(Uuid);

impl Token {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the wire form produced by `Display`. Forged or stale strings that
    /// are not valid tokens yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::try_parse(s.trim()).ok().map(Self)
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Token {
    // 32 hex chars keeps `approve:<token>` well under the 64-byte callback limit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// What happens to a candidate once it has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Keep decided candidates for the process lifetime so later edits can
    /// still reach the broadcast posting.
    #[default]
    RetainDecided,
    /// Forget a candidate as soon as it is decided.
    DropDecided,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub token: Token,
    /// Composed, translated and length-capped moderator text.
    pub display_text: String,
    /// Moderator edit; supersedes `display_text` for broadcasts.
    pub edited_text: Option<String>,
    pub image_url: Option<String>,
    pub canonical_key: String,
    pub source_link: String,
    pub moderator_ref: Option<PostingRef>,
    pub broadcast_ref: Option<PostingRef>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(
        token: Token,
        display_text: impl Into<String>,
        image_url: Option<String>,
        canonical_key: impl Into<String>,
        source_link: impl Into<String>,
    ) -> Self {
        Self {
            token,
            display_text: display_text.into(),
            edited_text: None,
            image_url,
            canonical_key: canonical_key.into(),
            source_link: source_link.into(),
            moderator_ref: None,
            broadcast_ref: None,
            status: CandidateStatus::Pending,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    /// Text to broadcast: the moderator edit if any, else the composed text.
    pub fn current_text(&self) -> &str {
        self.edited_text.as_deref().unwrap_or(&self.display_text)
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

/// Shared handle. One writer at a time across register, decide and edit.
pub type SharedStore = Arc<Mutex<ModerationStore>>;

#[derive(Debug, Default)]
pub struct ModerationStore {
    candidates: HashMap<Token, Candidate>,
    by_posting: HashMap<PostingRef, Token>,
    retention: RetentionPolicy,
}

impl ModerationStore {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            candidates: HashMap::new(),
            by_posting: HashMap::new(),
            retention,
        }
    }

    pub fn shared(retention: RetentionPolicy) -> SharedStore {
        Arc::new(Mutex::new(Self::new(retention)))
    }

    /// Insert a fresh pending candidate. A token that already exists is an
    /// internal invariant violation.
    pub fn register(&mut self, mut candidate: Candidate) -> Result<(), ModerationError> {
        let token = candidate.token;
        if self.candidates.contains_key(&token) {
            return Err(ModerationError::TokenCollision(token));
        }
        candidate.status = CandidateStatus::Pending;
        candidate.broadcast_ref = None;
        candidate.decided_at = None;
        if let Some(posting) = &candidate.moderator_ref {
            self.by_posting.insert(posting.clone(), token);
        }
        debug!(target: "moderation", %token, key = %candidate.canonical_key, "candidate registered");
        self.candidates.insert(token, candidate);
        Ok(())
    }

    /// Bind the moderator posting once it exists. Returns false for unknown tokens.
    pub fn attach_moderator_ref(&mut self, token: &Token, posting: PostingRef) -> bool {
        let Some(c) = self.candidates.get_mut(token) else {
            return false;
        };
        if let Some(old) = c.moderator_ref.replace(posting.clone()) {
            self.by_posting.remove(&old);
        }
        self.by_posting.insert(posting, *token);
        true
    }

    /// Remove a candidate whose moderator posting could not be created.
    pub fn discard(&mut self, token: &Token) -> Option<Candidate> {
        let c = self.candidates.remove(token)?;
        if let Some(posting) = &c.moderator_ref {
            self.by_posting.remove(posting);
        }
        Some(c)
    }

    pub fn get(&self, token: &Token) -> Option<&Candidate> {
        self.candidates.get(token)
    }

    /// The candidate only while it is still awaiting a decision.
    pub fn pending(&self, token: &Token) -> Option<&Candidate> {
        self.candidates
            .get(token)
            .filter(|c| c.status == CandidateStatus::Pending)
    }

    pub fn token_for_posting(&self, posting: &PostingRef) -> Option<Token> {
        self.by_posting.get(posting).copied()
    }

    pub fn approve(
        &mut self,
        token: &Token,
        broadcast_ref: PostingRef,
    ) -> Result<Candidate, ModerationError> {
        self.finish(token, CandidateStatus::Approved, Some(broadcast_ref))
    }

    pub fn reject(&mut self, token: &Token) -> Result<Candidate, ModerationError> {
        self.finish(token, CandidateStatus::Rejected, None)
    }

    fn finish(
        &mut self,
        token: &Token,
        to: CandidateStatus,
        broadcast_ref: Option<PostingRef>,
    ) -> Result<Candidate, ModerationError> {
        let c = self
            .candidates
            .get_mut(token)
            .ok_or(ModerationError::UnknownToken(*token))?;
        if c.status != CandidateStatus::Pending {
            return Err(ModerationError::InvalidTransition {
                token: *token,
                from: c.status,
                to,
            });
        }
        c.status = to;
        c.broadcast_ref = broadcast_ref;
        c.decided_at = Some(Utc::now());
        let decided = c.clone();
        info!(target: "moderation", %token, status = %to, "candidate decided");

        if self.retention == RetentionPolicy::DropDecided {
            self.discard(token);
        }
        Ok(decided)
    }

    /// Store a moderator edit. Returns the updated candidate.
    pub fn record_edit(&mut self, token: &Token, text: impl Into<String>) -> Option<Candidate> {
        let c = self.candidates.get_mut(token)?;
        c.edited_text = Some(text.into());
        Some(c.clone())
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.candidates
            .values()
            .filter(|c| c.status == CandidateStatus::Pending)
            .count()
    }
}
