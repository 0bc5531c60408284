//! Structured decision the model is asked to reply with.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Instruction appended to every model request.
pub const HINT_PROMPT: &str = r#"
You should respond in the following format, which can be loaded by a JSON parser:
{
    "thought": "analyze the present situation, and what move you should make",
    "move": [row index, column index]
}
"#;

/// A model decision: free-text rationale plus a zero-based `[row, column]` move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub thought: String,
    #[serde(rename = "move")]
    pub position: [i64; 2],
}

impl Decision {
    /// Best-effort decode from a model reply.
    ///
    /// Tries the whole reply, then a fenced code block, then the outermost
    /// braces. Returns `None` when no candidate decodes.
    pub fn extract(text: &str) -> Option<Self> {
        candidates(text).into_iter().find_map(|candidate| {
            match serde_json::from_str::<Self>(candidate) {
                Ok(decision) => Some(decision),
                Err(err) => {
                    debug!("decision candidate rejected (error={err})");
                    None
                }
            }
        })
    }

    /// The full structured payload, rationale included.
    pub fn to_value(&self) -> Value {
        json!({
            "thought": self.thought,
            "move": self.position,
        })
    }

    /// The action alone, as stored in shared memory.
    pub fn move_value(&self) -> Value {
        json!(self.position)
    }
}

fn candidates(text: &str) -> Vec<&str> {
    let mut found = vec![text.trim()];
    if let Ok(fence) = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```")
        && let Some(inner) = fence.captures(text).and_then(|caps| caps.get(1))
    {
        found.push(inner.as_str());
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && start < end
    {
        found.push(&text[start..=end]);
    }
    found
}
