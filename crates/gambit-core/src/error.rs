//! Error types for the core turn crate.

use gambit_memory::MemoryError;
use thiserror::Error;

/// Errors raised while flattening prompt inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Input is neither skippable, a record, nor a sequence of records.
    #[error("prompt input {position} must be a message or a list of messages, got {kind}")]
    UnsupportedInput { position: usize, kind: &'static str },
}

/// Errors returned by a model gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request never completed.
    #[error("model request failed: {0}")]
    Transport(String),
    /// Remote service answered with a non-success status.
    #[error("model service returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body lacked the expected fields.
    #[error("malformed model response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Errors returned by a single agent turn.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// Prompt formatting failure.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Memory store failure.
    #[error(transparent)]
    Memory(#[from] MemoryError),
    /// Interactive input could not be read or parsed.
    #[error("input error: {0}")]
    Input(String),
}
