//! Conversation memory for Gambit agents.
//!
//! Holds the message envelope exchanged between participants and the ordered,
//! deduplicating store each agent keeps its history in.

pub mod error;
pub mod message;
pub mod record;
pub mod store;

/// Memory error type.
pub use error::MemoryError;
/// Message envelope model.
pub use message::{MessageEnvelope, MessageKind, Role, content_to_string};
/// Record identity and embedding hooks.
pub use record::{Embedder, Record};
/// In-process memory store and its export/load types.
pub use store::{ExportOptions, Exported, LoadSource, MemoryStore};
