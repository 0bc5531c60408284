//! Terminal output for spoken messages.

use gambit_core::{OutputSink, pretty_content};
use gambit_memory::MessageEnvelope;

/// Prints each spoken message as `name: content` on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Text printed for a message.
    pub fn render(message: &MessageEnvelope) -> String {
        format!("{}: {}", message.name(), pretty_content(message.content()))
    }
}

impl OutputSink for ConsoleSink {
    fn speak(&self, message: &MessageEnvelope) {
        println!("{}", Self::render(message));
    }
}
