//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of scenario setup so `main` can
//! propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: mason_core::config::ConfigError,
    },

    /// Registering an agent with the runtime failed.
    #[error("runtime error: {source}")]
    Runtime {
        /// The underlying runtime error.
        #[from]
        source: mason_core::runtime::RuntimeError,
    },

    /// A scripted command names an agent the scenario never spawned.
    #[error("demo command at tick {at_tick} targets unknown agent '{agent}'")]
    UnknownDemoAgent {
        /// The name in the command.
        agent: String,
        /// Tick the command was scheduled for.
        at_tick: u64,
    },
}
