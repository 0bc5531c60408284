//! Command-line entry point for running and replaying Gambit sessions.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use gambit::config::{AgentKind, GambitConfig};
use gambit::core::{ChatCompletionsGateway, ModelGateway, OutputSink, TurnLoop};
use gambit::memory::{MemoryStore, MessageEnvelope, Role};
use gambit::{API_KEY_ENV, ConsoleSink, build_agents, export_memories, gateway_config};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line options for the Gambit CLI.
#[derive(Parser)]
#[command(name = "gambit", version, about)]
struct Cli {
    /// Optional path to a gambit.json5 config file (skips layered discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a session between the configured agents
    Play {
        /// Let an operator play the first agent's moves
        #[arg(long)]
        human: bool,
        /// Override the maximum number of turns
        #[arg(long)]
        turns: Option<usize>,
        /// Write each agent's memory to this directory afterwards
        #[arg(long)]
        export: Option<PathBuf>,
        /// Override the model identifier
        #[arg(long)]
        model: Option<String>,
    },
    /// Print every record of an exported memory file
    Replay {
        /// Memory file written by `play --export`
        file: PathBuf,
    },
}

/// Entry point for the Gambit CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gambit::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Play {
            human,
            turns,
            export,
            model,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if human {
                match config.agents.first_mut() {
                    Some(agent) => agent.kind = AgentKind::Human,
                    None => bail!("no agents configured"),
                }
            }
            if let Some(turns) = turns {
                config.session.max_turns = turns;
            }
            if let Some(model) = model {
                config.model.model = model;
            }
            if let Some(export) = export {
                config.memory.export_dir = Some(export);
            }
            config.validate().context("invalid session settings")?;
            play(config).await
        }
        Command::Replay { file } => replay(file),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GambitConfig> {
    if let Some(path) = path {
        return GambitConfig::load_from_path(path).context("failed to load config");
    }
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let layered = GambitConfig::load_layered(&cwd).context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

async fn play(config: GambitConfig) -> anyhow::Result<()> {
    let gateway_config = gateway_config(&config.model, std::env::var(API_KEY_ENV).ok());
    if gateway_config.api_key.is_none() {
        warn!("no api key configured (env={API_KEY_ENV}), sending unauthenticated requests");
    }
    info!(
        "starting session (agents={}, max_turns={}, model={})",
        config.agents().len(),
        config.session.max_turns,
        gateway_config.model
    );

    let gateway: Arc<dyn ModelGateway> = Arc::new(ChatCompletionsGateway::new(gateway_config));
    let sink: Arc<dyn OutputSink> = Arc::new(ConsoleSink);
    let agents =
        build_agents(&config, gateway, None, sink.clone()).context("failed to build agents")?;

    let opening = MessageEnvelope::new("host", config.session.opening_prompt.as_str(), Role::User);
    sink.speak(&opening);

    let mut session = TurnLoop::new(agents, config.session.max_turns);
    let outcome = session.run(Some(opening)).await;
    info!("session ended (messages={})", session.transcript().len());

    if let Some(dir) = &config.memory.export_dir {
        let written = export_memories(session.agents(), dir)
            .with_context(|| format!("failed to export memory to {}", dir.display()))?;
        for path in written {
            println!("memory written to {}", path.display());
        }
    }

    outcome.context("session aborted")?;
    Ok(())
}

fn replay(file: PathBuf) -> anyhow::Result<()> {
    let mut memory: MemoryStore = MemoryStore::new();
    let loaded = memory
        .load(file.as_path(), false)
        .with_context(|| format!("failed to load memory from {}", file.display()))?;
    info!("replaying memory (path={}, records={loaded})", file.display());
    for record in memory.records() {
        println!("[{}] {}", record.timestamp(), record.render_as_text());
    }
    Ok(())
}
