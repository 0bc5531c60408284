use gambit_core::OutputSink;
use gambit_memory::MessageEnvelope;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub spoken: Arc<Mutex<Vec<MessageEnvelope>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<MessageEnvelope> {
        self.spoken.lock().clone()
    }
}

impl OutputSink for CollectingSink {
    fn speak(&self, message: &MessageEnvelope) {
        self.spoken.lock().push(message.clone());
    }
}
