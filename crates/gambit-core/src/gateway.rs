//! Transport boundary to the remote chat model.

use crate::error::GatewayError;
use crate::formatter::PromptBlock;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Sends a formatted payload to a model and returns its raw completion text.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn send(&self, payload: &[PromptBlock]) -> Result<String, GatewayError>;
}

/// Connection settings injected into [`ChatCompletionsGateway`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Full chat-completions URL.
    pub endpoint: String,
    /// Bearer credential; requests are sent unauthenticated when absent.
    pub api_key: Option<String>,
    /// Model identifier sent with each request.
    pub model: String,
}

/// Gateway for OpenAI-compatible `chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct ChatCompletionsGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl ChatCompletionsGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing HTTP client.
    pub fn with_client(client: reqwest::Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl ModelGateway for ChatCompletionsGateway {
    async fn send(&self, payload: &[PromptBlock]) -> Result<String, GatewayError> {
        let body = json!({
            "model": self.config.model,
            "messages": payload,
        });
        debug!(
            "sending model request (endpoint={}, model={}, blocks={})",
            self.config.endpoint,
            self.config.model,
            payload.len()
        );

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "model service rejected request (status={}, endpoint={})",
                status.as_u16(),
                self.config.endpoint
            );
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;
        completion_text(&value)
    }
}

/// Extract `choices[0].message.content` from a chat-completions body.
fn completion_text(value: &Value) -> Result<String, GatewayError> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            GatewayError::Malformed("missing choices[0].message.content".to_string())
        })
}
