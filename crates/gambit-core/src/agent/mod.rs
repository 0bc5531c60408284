//! Agent turn controller.
//!
//! An [`Agent`] owns its memory and composes one [`Responder`] that produces
//! the next record from the conversation so far.

use crate::error::AgentError;
use crate::sink::{LogSink, OutputSink};
use async_trait::async_trait;
use gambit_memory::{MemoryStore, MessageEnvelope, Role};
use log::{debug, info};
use std::fmt;
use std::sync::Arc;

mod human;
mod model;

pub use human::{HumanResponder, LineMoveReader, MoveInput, StdinMoveReader};
pub use model::ModelResponder;

/// Speaker name of the seeded system prompt record.
const SYSTEM_SPEAKER: &str = "system";

/// Output of one responder call.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// What observers see through the output sink.
    pub spoken: MessageEnvelope,
    /// What is appended to memory and returned to the caller.
    pub record: MessageEnvelope,
}

/// Capability to produce the next record given prior conversation state.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, name: &str, memory: &MemoryStore) -> Result<Response, AgentError>;
}

/// One conversation participant.
pub struct Agent {
    name: String,
    memory: MemoryStore,
    responder: Box<dyn Responder>,
    sink: Arc<dyn OutputSink>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("memory", &self.memory.size())
            .finish()
    }
}

impl Agent {
    /// Create an agent with empty memory that speaks to the log.
    pub fn new(name: impl Into<String>, responder: impl Responder + 'static) -> Self {
        Self {
            name: name.into(),
            memory: MemoryStore::new(),
            responder: Box::new(responder),
            sink: Arc::new(LogSink),
        }
    }

    /// Record `Msg("system", prompt, role=system)` so it leads every request.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Result<Self, AgentError> {
        let prompt: String = prompt.into();
        let seed = MessageEnvelope::new(SYSTEM_SPEAKER, prompt, Role::System);
        self.memory.add([seed], false)?;
        Ok(self)
    }

    /// Replace the output sink.
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Start from an existing memory store.
    pub fn with_memory(mut self, memory: MemoryStore) -> Self {
        self.memory = memory;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    /// Run one turn.
    ///
    /// The incoming record stays in memory even when the responder fails; the
    /// outgoing record is appended only on success.
    pub async fn reply(
        &mut self,
        incoming: Option<MessageEnvelope>,
    ) -> Result<MessageEnvelope, AgentError> {
        if let Some(incoming) = incoming {
            debug!(
                "agent received message (agent={}, from={})",
                self.name,
                incoming.name()
            );
            self.memory.add([incoming], false)?;
        }

        let response = self.responder.respond(&self.name, &self.memory).await?;
        self.sink.speak(&response.spoken);

        self.memory.add([response.record.clone()], false)?;
        info!(
            "agent turn complete (agent={}, memory={})",
            self.name,
            self.memory.size()
        );
        Ok(response.record)
    }
}
