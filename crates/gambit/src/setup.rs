//! Turns a loaded config into runnable agents and persists their memory.

use gambit_config::{AgentKind, GambitConfig, ModelConfig};
use gambit_core::{
    Agent, AgentError, GatewayConfig, HumanResponder, ModelGateway, ModelResponder, MoveInput,
    OutputSink, StdinMoveReader,
};
use gambit_memory::{ExportOptions, Exported, MemoryError};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable consulted when the config carries no api key.
pub const API_KEY_ENV: &str = "GAMBIT_API_KEY";

/// Gateway settings from the model section, with `env_key` as credential fallback.
pub fn gateway_config(model: &ModelConfig, env_key: Option<String>) -> GatewayConfig {
    GatewayConfig {
        endpoint: model.endpoint.clone(),
        api_key: model.api_key.clone().or(env_key),
        model: model.model.clone(),
    }
}

/// Build agents in turn order, each seeded with its system prompt.
///
/// Model agents share `gateway`; human agents share `input` when given,
/// otherwise a single standard input reader.
pub fn build_agents(
    config: &GambitConfig,
    gateway: Arc<dyn ModelGateway>,
    input: Option<Arc<dyn MoveInput>>,
    sink: Arc<dyn OutputSink>,
) -> Result<Vec<Agent>, AgentError> {
    let input: Arc<dyn MoveInput> = match input {
        Some(input) => input,
        None => Arc::new(StdinMoveReader::stdin()),
    };
    let mut agents = Vec::with_capacity(config.agents().len());
    for agent_config in config.agents() {
        let agent = match agent_config.kind {
            AgentKind::Model => Agent::new(
                agent_config.name.as_str(),
                ModelResponder::new(gateway.clone()).with_recent_n(config.memory.recent_n),
            ),
            AgentKind::Human => Agent::new(
                agent_config.name.as_str(),
                HumanResponder::new(input.clone()),
            ),
        };
        debug!(
            "built agent (name={}, kind={:?})",
            agent_config.name, agent_config.kind
        );
        agents.push(
            agent
                .with_sink(sink.clone())
                .with_system_prompt(agent_config.system_prompt())?,
        );
    }
    Ok(agents)
}

/// Write each agent's memory to `<dir>/<name>.json`, creating `dir` if needed.
pub fn export_memories(agents: &[Agent], dir: &Path) -> Result<Vec<PathBuf>, MemoryError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(agents.len());
    for agent in agents {
        let path = dir.join(format!("{}.json", file_stem(agent.name())));
        if let Exported::File(path) = agent.memory().export(&ExportOptions::file(path))? {
            info!(
                "exported agent memory (agent={}, path={})",
                agent.name(),
                path.display()
            );
            written.push(path);
        }
    }
    Ok(written)
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
