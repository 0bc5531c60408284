//! Turn orchestration for Gambit agents.
//!
//! This crate formats agent memory into model prompts, talks to the remote
//! model, decodes structured decisions and drives the per-turn control loop.

pub mod agent;
pub mod decision;
pub mod error;
pub mod formatter;
pub mod gateway;
pub mod session;
pub mod sink;

/// Agent turn controller and the reply capabilities it composes.
pub use agent::{
    Agent, HumanResponder, LineMoveReader, ModelResponder, MoveInput, Responder, Response,
    StdinMoveReader,
};
/// Structured decision decoding.
pub use decision::{Decision, HINT_PROMPT};
pub use error::{AgentError, FormatError, GatewayError};
/// Prompt formatting primitives.
pub use formatter::{ConversationFormatter, HISTORY_HEADER, PromptBlock, PromptInput};
/// Model transport boundary.
pub use gateway::{ChatCompletionsGateway, GatewayConfig, ModelGateway};
pub use session::TurnLoop;
pub use sink::{LogSink, OutputSink, pretty_content};
