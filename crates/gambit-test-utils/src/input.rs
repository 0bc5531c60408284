use async_trait::async_trait;
use gambit_core::{AgentError, MoveInput};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Typed lines replayed in order; reading past the end is an input error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMoves {
    lines: Arc<Mutex<VecDeque<String>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedMoves {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(Mutex::new(lines.into_iter().map(Into::into).collect())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl MoveInput for ScriptedMoves {
    async fn read_line(&self, prompt: &str) -> Result<String, AgentError> {
        self.prompts.lock().push(prompt.to_string());
        self.lines
            .lock()
            .pop_front()
            .ok_or_else(|| AgentError::Input("input closed".to_string()))
    }
}
