// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod canonical;
pub mod compose;
pub mod config;
pub mod decision;
pub mod edits;
pub mod error;
pub mod image;
pub mod ingest;
pub mod relevance;
pub mod store;
pub mod telemetry;
pub mod translate;

// Outbound surfaces (moderator chat, broadcast channel) and inbound updates
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::canonical::canonicalize;
pub use crate::config::AppConfig;
pub use crate::decision::{DecisionHandler, DecisionOutcome, ModerationAction};
pub use crate::edits::{EditOutcome, EditPropagator};
pub use crate::ingest::types::{Enclosure, FeedItem, FeedSource};
pub use crate::ingest::Ingestor;
pub use crate::notify::{BroadcastSurface, ModeratorSurface, PostingRef};
pub use crate::store::{Candidate, CandidateStatus, ModerationStore, RetentionPolicy, SharedStore, Token};
