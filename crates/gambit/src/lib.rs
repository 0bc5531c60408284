//! Public SDK surface for Gambit.
//!
//! This crate re-exports the building blocks, wires configuration into agents
//! and provides a small initialization helper to keep consumer setup
//! consistent.

pub mod console;
pub mod setup;

/// Re-export for convenience.
pub use gambit_config as config;
pub use gambit_core as core;
/// Re-export for convenience.
pub use gambit_memory as memory;

pub use console::ConsoleSink;
pub use setup::{API_KEY_ENV, build_agents, export_memories, gateway_config};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
