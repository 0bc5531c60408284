//! Model-backed responder.

use super::{Responder, Response};
use crate::decision::{Decision, HINT_PROMPT};
use crate::error::AgentError;
use crate::formatter::{ConversationFormatter, PromptInput};
use crate::gateway::ModelGateway;
use async_trait::async_trait;
use gambit_memory::{MemoryStore, MessageEnvelope, Role};
use log::warn;
use std::sync::Arc;

/// Asks a model gateway for a [`Decision`].
///
/// The spoken message carries the whole decision; memory keeps the move only.
/// A reply that does not decode is kept as raw text.
#[derive(Clone)]
pub struct ModelResponder {
    gateway: Arc<dyn ModelGateway>,
    formatter: ConversationFormatter,
    hint: String,
    recent_n: Option<usize>,
}

impl ModelResponder {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            gateway,
            formatter: ConversationFormatter::new(),
            hint: HINT_PROMPT.to_string(),
            recent_n: None,
        }
    }

    /// Replace the instruction block appended to every request.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Only send the last `recent_n` records of memory.
    pub fn with_recent_n(mut self, recent_n: Option<usize>) -> Self {
        self.recent_n = recent_n;
        self
    }
}

#[async_trait]
impl Responder for ModelResponder {
    async fn respond(&self, name: &str, memory: &MemoryStore) -> Result<Response, AgentError> {
        let history = memory.get_memory(self.recent_n, None);
        let hint = MessageEnvelope::new("system", self.hint.as_str(), Role::System);
        let payload = self
            .formatter
            .format([PromptInput::from(&history), PromptInput::from(&hint)])?;

        let text = self.gateway.send(&payload).await?;

        match Decision::extract(&text) {
            Some(decision) => {
                let record = MessageEnvelope::new(name, decision.move_value(), Role::Assistant);
                let spoken = MessageEnvelope::new(name, decision.to_value(), Role::Assistant);
                Ok(Response { spoken, record })
            }
            None => {
                warn!("model reply is not a decision, storing raw text (agent={name})");
                let record = MessageEnvelope::new(name, text, Role::Assistant);
                Ok(Response {
                    spoken: record.clone(),
                    record,
                })
            }
        }
    }
}
