//! Human-backed responder.

use super::{Responder, Response};
use crate::error::AgentError;
use async_trait::async_trait;
use gambit_memory::{MemoryStore, MessageEnvelope, Role};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tokio::sync::Mutex;

/// Prompt shown before reading a move.
const MOVE_PROMPT: &str = "Please enter the X and Y coordinates of the game you want to play : ";

/// Source of typed moves.
#[async_trait]
pub trait MoveInput: Send + Sync {
    /// Show `prompt` and return one line of input.
    async fn read_line(&self, prompt: &str) -> Result<String, AgentError>;
}

#[async_trait]
impl<T: MoveInput + ?Sized> MoveInput for Arc<T> {
    async fn read_line(&self, prompt: &str) -> Result<String, AgentError> {
        (**self).read_line(prompt).await
    }
}

/// Shows prompts on `writer` and reads moves line by line from `reader`.
///
/// One reader is kept for the whole session so buffered lines are not lost
/// between turns.
pub struct LineMoveReader<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
}

/// Line reader bound to the process stdin and stdout.
pub type StdinMoveReader = LineMoveReader<BufReader<Stdin>, Stdout>;

impl<R, W> LineMoveReader<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }
}

impl StdinMoveReader {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

#[async_trait]
impl<R, W> MoveInput for LineMoveReader<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_line(&self, prompt: &str) -> Result<String, AgentError> {
        {
            let mut writer = self.writer.lock().await;
            writer
                .write_all(prompt.as_bytes())
                .await
                .map_err(|err| AgentError::Input(err.to_string()))?;
            writer
                .flush()
                .await
                .map_err(|err| AgentError::Input(err.to_string()))?;
        }

        let mut line = String::new();
        let read = self
            .reader
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|err| AgentError::Input(err.to_string()))?;
        if read == 0 {
            return Err(AgentError::Input("input closed".to_string()));
        }
        Ok(line)
    }
}

/// Reads `"X Y"` from an operator and answers `[Y, X]` with role `user`.
///
/// The typed order is (x, y) and the stored pair is swapped, so it does not
/// line up with the `[row, column]` order model decisions use.
pub struct HumanResponder {
    input: Box<dyn MoveInput>,
}

impl HumanResponder {
    pub fn new(input: impl MoveInput + 'static) -> Self {
        Self {
            input: Box::new(input),
        }
    }

    /// Responder bound to standard input.
    pub fn stdin() -> Self {
        Self::new(StdinMoveReader::stdin())
    }
}

#[async_trait]
impl Responder for HumanResponder {
    async fn respond(&self, name: &str, _memory: &MemoryStore) -> Result<Response, AgentError> {
        let line = self.input.read_line(MOVE_PROMPT).await?;
        let [x, y] = parse_coordinates(&line)?;
        let record = MessageEnvelope::new(name, json!([y, x]), Role::User);
        Ok(Response {
            spoken: record.clone(),
            record,
        })
    }
}

fn parse_coordinates(line: &str) -> Result<[i64; 2], AgentError> {
    let values = line
        .split_whitespace()
        .map(str::parse::<i64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| AgentError::Input(format!("invalid coordinate in {line:?}: {err}")))?;
    match values.as_slice() {
        [x, y] => Ok([*x, *y]),
        _ => Err(AgentError::Input(format!(
            "expected two coordinates, got {} in {line:?}",
            values.len()
        ))),
    }
}
