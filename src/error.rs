//! Error types for the moderation service.

use crate::store::{CandidateStatus, Token};

/// Startup configuration errors. These are the only fatal errors in the service.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Store-level state machine violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModerationError {
    #[error("Token {0} is already registered")]
    TokenCollision(Token),

    #[error("Token {0} is not tracked")]
    UnknownToken(Token),

    #[error("Candidate {token} already {from}, cannot transition to {to}")]
    InvalidTransition {
        token: Token,
        from: CandidateStatus,
        to: CandidateStatus,
    },
}

/// Moderator / broadcast surface failures (outbound chat-platform calls).
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("HTTP error calling {method}: {reason}")]
    Http { method: String, reason: String },

    #[error("{method} rejected: {description}")]
    Api { method: String, description: String },

    #[error("Malformed response from {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
}

/// Translation provider failures. Never surfaced past the translator.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}
