//! Error types for the postit registry
//!
//! None of these escape the registry's public operations: every rejection on
//! the emit and dispatch paths is silent for the caller. They exist so the
//! codec can report precisely why a message was dropped, and so the drop can
//! be logged and counted.

use thiserror::Error;

/// Errors produced while building, encoding or decoding an envelope
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Envelope is not a JSON object")]
    NotAnObject,

    #[error("Envelope is missing field {0}")]
    MissingField(&'static str),

    #[error("Envelope field {0} is not a non-empty string")]
    InvalidField(&'static str),

    #[error("Protocol tag mismatch: expected {expected}, received {received}")]
    TagMismatch { expected: String, received: String },

    #[error("Payload cannot be serialized: {0}")]
    Unserializable(String),
}

impl EnvelopeError {
    /// Short label used as a structured logging field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::NotAnObject => "not_an_object",
            Self::MissingField(_) => "missing_field",
            Self::InvalidField(_) => "invalid_field",
            Self::TagMismatch { .. } => "tag_mismatch",
            Self::Unserializable(_) => "unserializable",
        }
    }
}

/// Errors from registry configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Protocol tag cannot be empty")]
    EmptyTag,
}
