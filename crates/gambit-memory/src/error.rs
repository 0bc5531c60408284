//! Error types for memory operations.

/// Errors returned by the memory store and envelope helpers.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Raw input could not be parsed as structured data.
    #[error("cannot load [{input}] as json: {source}")]
    Decode {
        input: String,
        #[source]
        source: serde_json::Error,
    },
    /// Embedding was requested but the store has no embedder.
    #[error("embedding requested but no embedder is configured")]
    MissingEmbedder,
    /// Export was called without choosing a target.
    #[error("export requires a target: set to_memory or a file path")]
    MissingExportTarget,
    /// The embedder failed for a record.
    #[error("embedding failed: {0}")]
    Embedding(String),
    /// A role string outside system/user/assistant.
    #[error("invalid role: {0}")]
    InvalidRole(String),
}
