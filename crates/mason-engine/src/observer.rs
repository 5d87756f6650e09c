//! Tick observer that drives the demo scenario.
//!
//! After each tick it advances the world's mob simulation, submits any
//! scripted commands that have come due, and logs every notice the agents
//! raised so the run reads like a chat transcript.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use mason_core::config::DemoCommand;
use mason_core::runner::TickObserver;
use mason_core::runtime::AgentRuntime;
use mason_types::AgentId;
use mason_world::GridWorld;
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Ticks between build progress log lines.
const PROGRESS_LOG_INTERVAL: u64 = 50;

/// A command resolved to the agent that will receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    at_tick: u64,
    agent: AgentId,
    command: String,
}

/// Observer that plays a command script against the runtime.
#[derive(Debug)]
pub struct DemoObserver {
    world: Arc<GridWorld>,
    names: BTreeMap<AgentId, String>,
    schedule: VecDeque<Scheduled>,
}

impl DemoObserver {
    /// Resolve `commands` against the spawned `agents`.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownDemoAgent`] if a command names an agent that
    /// was not spawned.
    pub fn new(
        world: Arc<GridWorld>,
        agents: &[(AgentId, String)],
        commands: &[DemoCommand],
    ) -> Result<Self, EngineError> {
        let mut schedule = Vec::with_capacity(commands.len());
        for command in commands {
            let agent = agents
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(&command.agent))
                .map(|(id, _)| *id)
                .ok_or_else(|| EngineError::UnknownDemoAgent {
                    agent: command.agent.clone(),
                    at_tick: command.at_tick,
                })?;
            schedule.push(Scheduled {
                at_tick: command.at_tick,
                agent,
                command: command.command.clone(),
            });
        }
        // Stable, so same-tick commands keep their file order.
        schedule.sort_by_key(|s| s.at_tick);

        Ok(Self {
            world,
            names: agents.iter().cloned().collect(),
            schedule: schedule.into(),
        })
    }

    /// Commands not yet submitted.
    pub fn pending(&self) -> usize {
        self.schedule.len()
    }

    fn name_of(&self, agent: AgentId) -> &str {
        self.names.get(&agent).map_or("?", String::as_str)
    }

    fn submit_due(&mut self, tick: u64, runtime: &AgentRuntime) {
        while self.schedule.front().is_some_and(|s| s.at_tick <= tick) {
            let Some(due) = self.schedule.pop_front() else {
                break;
            };
            let agent = self.name_of(due.agent);
            info!(tick, agent, command = %due.command, "Player command");
            if let Err(e) = runtime.submit(due.agent, &due.command) {
                warn!(tick, agent, error = %e, "Command rejected");
            }
        }
    }

    fn log_notices(&self, tick: u64, runtime: &AgentRuntime) {
        for (agent, name) in &self.names {
            match runtime.take_notifications(*agent) {
                Ok(notices) => {
                    for notice in notices {
                        info!(tick, agent = name.as_str(), "{notice}");
                    }
                }
                Err(e) => warn!(tick, agent = name.as_str(), error = %e, "Notices unavailable"),
            }
        }
    }

    fn log_progress(tick: u64, runtime: &AgentRuntime) {
        if tick.checked_rem(PROGRESS_LOG_INTERVAL) != Some(0) {
            return;
        }
        for build in runtime.builds().active_builds() {
            let progress = build.progress();
            debug!(
                tick,
                build_id = %progress.build_id,
                percent = progress.percent(),
                issued = progress.issued,
                total = progress.total,
                "Build progress"
            );
        }
    }
}

impl TickObserver for DemoObserver {
    fn on_tick(&mut self, tick: u64, runtime: &AgentRuntime) {
        self.world.advance();
        self.submit_due(tick, runtime);
        self.log_notices(tick, runtime);
        Self::log_progress(tick, runtime);
    }
}
