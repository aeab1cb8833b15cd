//! Custom error types for the medical chat responder.

use thiserror::Error;

/// Unified error type propagated through every component.
#[derive(Debug, Error)]
pub enum MedAssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Completion API error: {0}")]
    Completion(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
