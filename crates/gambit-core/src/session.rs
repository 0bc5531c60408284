//! Turn-taking driver for a multi-agent conversation.

use crate::agent::Agent;
use crate::error::AgentError;
use gambit_memory::MessageEnvelope;
use log::{info, warn};

/// Alternates agents strictly one at a time, feeding each reply to the next.
#[derive(Debug)]
pub struct TurnLoop {
    agents: Vec<Agent>,
    max_turns: usize,
    transcript: Vec<MessageEnvelope>,
}

impl TurnLoop {
    pub fn new(agents: Vec<Agent>, max_turns: usize) -> Self {
        Self {
            agents,
            max_turns,
            transcript: Vec::new(),
        }
    }

    /// Play up to `max_turns` turns starting from an optional opening message.
    ///
    /// Returns the number of completed turns. The first failing turn aborts the
    /// loop; everything exchanged before it stays in [`TurnLoop::transcript`].
    pub async fn run(&mut self, opening: Option<MessageEnvelope>) -> Result<usize, AgentError> {
        if self.agents.is_empty() {
            warn!("turn loop has no agents, nothing to play");
            return Ok(0);
        }

        if let Some(opening) = &opening {
            self.transcript.push(opening.clone());
        }
        let mut incoming = opening;
        let count = self.agents.len();
        for turn in 0..self.max_turns {
            let agent = &mut self.agents[turn % count];
            let reply = match agent.reply(incoming.take()).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(
                        "turn failed, stopping (turn={}, agent={}, error={})",
                        turn + 1,
                        agent.name(),
                        err
                    );
                    return Err(err);
                }
            };
            self.transcript.push(reply.clone());
            incoming = Some(reply);
        }

        info!(
            "turn loop finished (turns={}, agents={})",
            self.max_turns,
            self.agents.len()
        );
        Ok(self.max_turns)
    }

    /// Every message exchanged so far, opening message first.
    pub fn transcript(&self) -> &[MessageEnvelope] {
        &self.transcript
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }
}
