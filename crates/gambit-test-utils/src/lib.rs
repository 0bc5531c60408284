//! Test helpers shared across Gambit crates.

pub mod gateway;
pub mod input;
pub mod sink;

pub use gateway::{FailingGateway, FixedGateway, RecordingGateway, ScriptedGateway};
pub use input::ScriptedMoves;
pub use sink::CollectingSink;
