//! Configuration schema for Gambit.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root config for a Gambit session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GambitConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,
}

impl Default for GambitConfig {
    fn default() -> Self {
        Self {
            schema: None,
            model: ModelConfig::default(),
            memory: MemoryConfig::default(),
            session: SessionConfig::default(),
            agents: default_agents(),
        }
    }
}

impl GambitConfig {
    /// Agents in turn order.
    pub fn agents(&self) -> &[AgentConfig] {
        &self.agents
    }
}

/// Remote chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    /// Full chat-completions URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer credential. Falls back to `GAMBIT_API_KEY` when absent.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Per-agent memory settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MemoryConfig {
    /// Only the last `recent_n` records are sent to the model.
    #[serde(default)]
    pub recent_n: Option<usize>,
    /// Directory each agent's memory file is exported to after a session.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

/// Turn loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Message handed to the first agent.
    #[serde(default = "default_opening_prompt")]
    pub opening_prompt: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            opening_prompt: default_opening_prompt(),
        }
    }
}

fn default_max_turns() -> usize {
    20
}

fn default_opening_prompt() -> String {
    "Let's begin the game! The board is empty.".to_string()
}

/// Who produces an agent's replies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Replies come from the configured model.
    #[default]
    Model,
    /// Replies are typed by an operator.
    Human,
}

/// A single conversation participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub kind: AgentKind,
    /// System prompt seeded into the agent's memory.
    #[serde(default)]
    pub sys_prompt: Option<String>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, kind: AgentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sys_prompt: None,
        }
    }

    /// The configured prompt, or the default Gomoku prompt for this agent.
    pub fn system_prompt(&self) -> String {
        match &self.sys_prompt {
            Some(prompt) => prompt.clone(),
            None => format!(
                "You're a skillful Gomoku player. You should play against your opponent \
                 according to the given situation. Your name is {}. The board is 15x15 \
                 with zero-based row and column indices.",
                self.name
            ),
        }
    }
}

fn default_agents() -> Vec<AgentConfig> {
    vec![
        AgentConfig::new("Black", AgentKind::Model),
        AgentConfig::new("White", AgentKind::Model),
    ]
}
