//! Generation error types.

use thiserror::Error;

/// Errors that can occur while generating nudge text.
#[derive(Debug, Error)]
pub enum BrainError {
    /// Configuration problem (missing API key, bad client setup).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network-level failure talking to the API.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered, but not with usable text.
    #[error("generation failed: {0}")]
    GenerationFailed(String),
}
