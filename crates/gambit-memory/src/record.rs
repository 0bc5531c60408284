//! Record abstraction the memory store is generic over.

use crate::error::MemoryError;
use crate::message::MessageEnvelope;
use serde_json::Value;

/// A unit the memory store can hold.
///
/// Identity is optional: records without an id are always appended, records
/// with an id are appended only once.
pub trait Record {
    /// Identity used for deduplication, never for ordering.
    fn record_id(&self) -> Option<&str>;

    /// Attach an embedding vector. Records that cannot carry one ignore it.
    fn attach_embedding(&mut self, _embedding: Vec<f32>) {}
}

impl Record for MessageEnvelope {
    fn record_id(&self) -> Option<&str> {
        Some(self.id())
    }

    fn attach_embedding(&mut self, embedding: Vec<f32>) {
        self.set_embedding(embedding);
    }
}

impl Record for Value {
    fn record_id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    fn attach_embedding(&mut self, embedding: Vec<f32>) {
        if let Some(map) = self.as_object_mut() {
            map.insert("embedding".to_string(), Value::from(embedding));
        }
    }
}

/// Produces embedding vectors for records added with `embed = true`.
pub trait Embedder<R>: Send + Sync {
    /// Embed a single record.
    fn embed(&self, record: &R) -> Result<Vec<f32>, MemoryError>;
}

impl<R, F> Embedder<R> for F
where
    F: Fn(&R) -> Result<Vec<f32>, MemoryError> + Send + Sync,
{
    fn embed(&self, record: &R) -> Result<Vec<f32>, MemoryError> {
        self(record)
    }
}
