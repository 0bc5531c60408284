use async_trait::async_trait;
use gambit_core::{GatewayError, ModelGateway, PromptBlock};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FixedGateway {
    response: String,
}

impl FixedGateway {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl ModelGateway for FixedGateway {
    async fn send(&self, _payload: &[PromptBlock]) -> Result<String, GatewayError> {
        Ok(self.response.clone())
    }
}

#[derive(Debug, Clone)]
pub struct RecordingGateway {
    response: String,
    pub last_payload: Arc<Mutex<Vec<PromptBlock>>>,
    pub calls: Arc<Mutex<usize>>,
}

impl RecordingGateway {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            last_payload: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl ModelGateway for RecordingGateway {
    async fn send(&self, payload: &[PromptBlock]) -> Result<String, GatewayError> {
        *self.last_payload.lock() = payload.to_vec();
        *self.calls.lock() += 1;
        Ok(self.response.clone())
    }
}

/// Returns queued responses in order, then fails once the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    responses: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedGateway {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Into::into).collect())),
        }
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn send(&self, _payload: &[PromptBlock]) -> Result<String, GatewayError> {
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| GatewayError::Transport("script exhausted".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct FailingGateway {
    message: String,
}

impl FailingGateway {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ModelGateway for FailingGateway {
    async fn send(&self, _payload: &[PromptBlock]) -> Result<String, GatewayError> {
        Err(GatewayError::Transport(self.message.clone()))
    }
}
