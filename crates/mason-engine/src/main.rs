//! Demo binary for Mason.
//!
//! Wires a seeded in-memory world, the rule planner, and the agent runtime
//! together, then runs the tick loop while a scripted set of player
//! commands plays out. The default script has one agent start a house and
//! a second agent join it, so the collaborative build path runs end to end.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `mason-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Spawn the scenario world and its agents
//! 4. Register the agents with the runtime
//! 5. Create run controls and install the Ctrl-C handler
//! 6. Run the tick loop
//! 7. Log the result

mod error;
mod observer;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use mason_build::BuildCoordinator;
use mason_core::config::{LoggingConfig, MasonConfig};
use mason_core::rules::RulePlanner;
use mason_core::runner::{self, RunControl};
use mason_core::runtime::AgentRuntime;
use mason_world::World;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer::DemoObserver;

/// Default configuration file, relative to the working directory.
const CONFIG_PATH: &str = "mason-config.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration. Logging depends on it, so this comes first.
    let config = load_config().context("loading configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        tick_interval_ms = config.runtime.tick_interval_ms,
        max_ticks = config.runtime.max_ticks,
        seed = config.demo.seed,
        "mason-engine starting"
    );

    // 3. Spawn the scenario.
    let scenario = spawner::spawn_scenario(&config.demo);

    // 4. Register agents.
    let world: Arc<dyn World> = Arc::clone(&scenario.world) as _;
    let runtime = AgentRuntime::new(
        world,
        Arc::new(BuildCoordinator::new()),
        Arc::new(RulePlanner::new()),
        config.executor.clone(),
    );
    for (agent, name) in &scenario.agents {
        runtime
            .register_agent(*agent, name)
            .map_err(EngineError::from)
            .with_context(|| format!("registering agent {name}"))?;
    }
    let mut observer = DemoObserver::new(
        Arc::clone(&scenario.world),
        &scenario.agents,
        &config.demo.commands,
    )
    .context("resolving demo commands")?;
    info!(
        agents = scenario.agents.len(),
        commands = observer.pending(),
        "Agents registered"
    );

    // 5. Run controls.
    let control = Arc::new(RunControl::new(&config.runtime));
    let stopper = Arc::clone(&control);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping at the next tick boundary");
            stopper.request_stop();
        }
    });

    // 6. Run.
    let result = runner::run(&runtime, &control, &config.build, &mut observer).await;

    // 7. Report.
    let elapsed = elapsed_seconds(&control);
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        builds_cleaned = result.builds_cleaned,
        active_builds = runtime.builds().len(),
        elapsed_seconds = elapsed,
        "mason-engine finished"
    );
    for (agent, name) in &scenario.agents {
        let history = runtime.history(*agent).map_err(EngineError::from)?;
        let successes = history.iter().filter(|e| e.result.success).count();
        info!(
            agent = name.as_str(),
            actions = history.len(),
            successes,
            "Agent summary"
        );
    }

    Ok(())
}

/// Load `mason-config.yaml`, or defaults when the file does not exist.
fn load_config() -> Result<MasonConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok(MasonConfig::from_file(path)?)
    } else {
        Ok(MasonConfig::parse("")?)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_err| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_err| EnvFilter::new("info"));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
    if !Path::new(CONFIG_PATH).exists() {
        warn!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
}

/// Whole seconds since the run controls were created.
fn elapsed_seconds(control: &RunControl) -> i64 {
    Utc::now()
        .signed_duration_since(control.started_at())
        .num_seconds()
}
