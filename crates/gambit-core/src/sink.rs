//! Side channel an agent speaks its replies through.

use gambit_memory::{MessageEnvelope, content_to_string};
use log::info;
use serde_json::Value;

/// Observer for what an agent says. Not part of any memory.
pub trait OutputSink: Send + Sync {
    fn speak(&self, message: &MessageEnvelope);
}

/// Writes spoken messages to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn speak(&self, message: &MessageEnvelope) {
        info!("{}: {}", message.name(), pretty_content(message.content()));
    }
}

/// Render content for display: strings verbatim, structures as indented JSON.
pub fn pretty_content(content: &Value) -> String {
    match content {
        Value::String(_) => content_to_string(content),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
