//! The multi-agent runtime.
//!
//! [`AgentRuntime`] owns one [`TaskExecutor`] per registered agent and the
//! shared [`BuildCoordinator`]. It is the surface the rest of the system
//! talks to: submit a command, tick, stop, and query.
//!
//! # Concurrency
//!
//! Each agent has a single-consumer inbox that only [`AgentRuntime::tick`]
//! drains, under the same mutex that guards the executor. `submit` never
//! touches the executor directly: it queues an interrupt, runs the planner
//! on the blocking pool, and queues the outcome. The interrupt and the
//! outcome both carry the submit's generation number; anything tagged with a
//! generation superseded by a later submit or a stop is discarded when it
//! arrives, so a late interrupt can never cancel a newer plan. `stop` takes
//! effect immediately.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use mason_agents::{ActionContext, ExecutorConfig, HistoryEntry, Notice, TaskExecutor};
use mason_build::BuildCoordinator;
use mason_types::AgentId;
use mason_world::World;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::direct::parse_build_command;
use crate::planner::{Plan, Planner, PlanningContext, PlanningError};

/// How far the planning context looks for entities.
const CONTEXT_RADIUS: u32 = 32;

/// Errors from runtime operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The agent was never registered.
    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),

    /// The agent is already registered.
    #[error("agent {0} is already registered")]
    AlreadyRegistered(AgentId),

    /// The world has no body for the agent.
    #[error("agent {0} has no body in the world")]
    NotInWorld(AgentId),
}

/// Messages from `submit` to the agent's next tick.
#[derive(Debug)]
enum Inbox {
    /// Cancel whatever is running before the next plan lands.
    Interrupt { generation: u64 },
    /// A plan is ready.
    Plan {
        generation: u64,
        command: String,
        plan: Plan,
    },
    /// The planner gave up.
    PlanFailed {
        generation: u64,
        command: String,
        reason: String,
    },
}

/// Executor plus the receiving half of its inbox.
#[derive(Debug)]
struct AgentState {
    executor: TaskExecutor,
    inbox: mpsc::UnboundedReceiver<Inbox>,
    /// Latest generation whose outcome has been applied (or abandoned).
    settled: u64,
}

#[derive(Debug)]
struct AgentSlot {
    name: String,
    state: Mutex<AgentState>,
    sender: mpsc::UnboundedSender<Inbox>,
    generation: AtomicU64,
}

impl AgentSlot {
    fn send(&self, message: Inbox) {
        // The receiver lives as long as the slot.
        if self.sender.send(message).is_err() {
            warn!(agent_name = %self.name, "agent inbox closed");
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1)
    }
}

/// Runs every registered agent's executor against one world.
pub struct AgentRuntime {
    world: Arc<dyn World>,
    builds: Arc<BuildCoordinator>,
    planner: Arc<dyn Planner>,
    config: ExecutorConfig,
    agents: DashMap<AgentId, Arc<AgentSlot>>,
}

impl core::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("agents", &self.agents.len())
            .field("builds", &self.builds.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AgentRuntime {
    /// Create a runtime with no agents.
    pub fn new(
        world: Arc<dyn World>,
        builds: Arc<BuildCoordinator>,
        planner: Arc<dyn Planner>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            world,
            builds,
            planner,
            config,
            agents: DashMap::new(),
        }
    }

    /// The world every action runs against.
    pub const fn world(&self) -> &Arc<dyn World> {
        &self.world
    }

    /// The shared build registry.
    pub const fn builds(&self) -> &Arc<BuildCoordinator> {
        &self.builds
    }

    // -------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------

    /// Give `agent` an executor. The world must already have a body for it.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::AlreadyRegistered`] or [`RuntimeError::NotInWorld`].
    pub fn register_agent(&self, agent: AgentId, name: &str) -> Result<(), RuntimeError> {
        if self.world.agent_position(agent).is_none() {
            return Err(RuntimeError::NotInWorld(agent));
        }
        let entry = match self.agents.entry(agent) {
            Entry::Occupied(_) => return Err(RuntimeError::AlreadyRegistered(agent)),
            Entry::Vacant(entry) => entry,
        };
        let (sender, inbox) = mpsc::unbounded_channel();
        entry.insert(Arc::new(AgentSlot {
            name: name.to_owned(),
            state: Mutex::new(AgentState {
                executor: TaskExecutor::new(agent, self.config.clone()),
                inbox,
                settled: 0,
            }),
            sender,
            generation: AtomicU64::new(0),
        }));
        info!(agent = %agent, agent_name = name, "Agent registered");
        Ok(())
    }

    /// Registered agents, in id order.
    pub fn agents(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.agents.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Look up a registered agent by display name (case-insensitive).
    pub fn agent_named(&self, name: &str) -> Option<AgentId> {
        self.agents
            .iter()
            .find(|e| e.value().name.eq_ignore_ascii_case(name.trim()))
            .map(|e| *e.key())
    }

    fn slot(&self, agent: AgentId) -> Result<Arc<AgentSlot>, RuntimeError> {
        self.agents
            .get(&agent)
            .map(|e| Arc::clone(e.value()))
            .ok_or(RuntimeError::UnknownAgent(agent))
    }

    // -------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------

    /// Hand a command to `agent`.
    ///
    /// Whatever the agent is doing is cancelled on its next tick. Direct
    /// build commands become a plan immediately; anything else goes to the
    /// planner on tokio's blocking pool, or inline when called outside a
    /// tokio runtime. The plan lands on a later tick.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn submit(&self, agent: AgentId, command: &str) -> Result<(), RuntimeError> {
        let slot = self.slot(agent)?;
        let generation = slot.next_generation();
        slot.send(Inbox::Interrupt { generation });
        info!(agent = %agent, command, generation, "Command submitted");

        if let Some(plan) = parse_build_command(command) {
            debug!(agent = %agent, "direct build command, skipping planner");
            slot.send(Inbox::Plan {
                generation,
                command: command.to_owned(),
                plan,
            });
            return Ok(());
        }

        let ctx = self.planning_context(agent, &slot.name);
        let planner = Arc::clone(&self.planner);
        let command = command.to_owned();
        let job = move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| planner.plan(&ctx, &command)))
                .unwrap_or_else(|_panic| {
                    Err(PlanningError::Internal {
                        message: "planner panicked".to_owned(),
                    })
                });
            let message = match outcome {
                Ok(plan) => Inbox::Plan {
                    generation,
                    command,
                    plan,
                },
                Err(e) => Inbox::PlanFailed {
                    generation,
                    command,
                    reason: reason_for(&e),
                },
            };
            slot.send(message);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                drop(handle.spawn_blocking(job));
            }
            Err(_no_runtime) => job(),
        }
        Ok(())
    }

    fn planning_context(&self, agent: AgentId, name: &str) -> PlanningContext {
        let position = self.world.agent_position(agent);
        let nearby_entities = position
            .map(|pos| self.world.entities_near(pos, CONTEXT_RADIUS))
            .unwrap_or_default();
        PlanningContext {
            agent,
            agent_name: name.to_owned(),
            position,
            nearby_entities,
            active_builds: self
                .builds
                .active_builds()
                .iter()
                .map(|b| b.progress())
                .collect(),
        }
    }

    /// Cancel the agent's work and discard any plan still being made.
    /// Stopping an idle agent does nothing.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn stop(&self, agent: AgentId) -> Result<(), RuntimeError> {
        let slot = self.slot(agent)?;
        let generation = slot.next_generation();
        let mut state = slot.state.lock();
        state.settled = generation;
        state.executor.stop();
        Ok(())
    }

    // -------------------------------------------------------------------
    // Ticking
    // -------------------------------------------------------------------

    /// Advance one agent by one tick: apply inbox messages, then tick the
    /// executor.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn tick(&self, agent: AgentId) -> Result<(), RuntimeError> {
        let slot = self.slot(agent)?;
        let mut guard = slot.state.lock();
        let state = &mut *guard;
        while let Ok(message) = state.inbox.try_recv() {
            // Reloaded per message: a submit racing this drain may already
            // have queued messages for a newer generation.
            let current = slot.generation.load(Ordering::Acquire);
            match message {
                Inbox::Interrupt { generation } if generation == current => {
                    state.executor.stop();
                }
                Inbox::Plan {
                    generation,
                    command,
                    plan,
                } if generation == current => {
                    state.settled = generation;
                    state.executor.accept_plan(&command, plan.goal, plan.tasks);
                }
                Inbox::PlanFailed {
                    generation,
                    command,
                    reason,
                } if generation == current => {
                    state.settled = generation;
                    state.executor.reject_plan(&command, &reason);
                }
                Inbox::Interrupt { generation }
                | Inbox::Plan { generation, .. }
                | Inbox::PlanFailed { generation, .. } => {
                    debug!(agent = %agent, generation, current, "discarding superseded message");
                }
            }
        }

        let ctx = ActionContext {
            agent,
            world: self.world.as_ref(),
            builds: &self.builds,
        };
        state.executor.tick(&ctx);
        Ok(())
    }

    /// Tick every registered agent once, in id order. Returns how many were
    /// ticked.
    pub fn tick_all(&self) -> usize {
        let mut ticked: usize = 0;
        for agent in self.agents() {
            if self.tick(agent).is_ok() {
                ticked = ticked.saturating_add(1);
            }
        }
        ticked
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Whether the agent has work: a running action, queued tasks, or a
    /// plan still being made.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn is_executing(&self, agent: AgentId) -> Result<bool, RuntimeError> {
        let slot = self.slot(agent)?;
        let planning = slot.generation.load(Ordering::Acquire);
        let state = slot.state.lock();
        Ok(state.executor.is_executing() || state.settled < planning)
    }

    /// The goal the agent is working toward.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn current_goal(&self, agent: AgentId) -> Result<Option<String>, RuntimeError> {
        let slot = self.slot(agent)?;
        let state = slot.state.lock();
        Ok(state.executor.current_goal().map(str::to_owned))
    }

    /// Description of the running action.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn current_action(&self, agent: AgentId) -> Result<Option<String>, RuntimeError> {
        let slot = self.slot(agent)?;
        let state = slot.state.lock();
        Ok(state
            .executor
            .current_action()
            .map(|a| a.description().to_owned()))
    }

    /// Drain the agent's pending notices.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn take_notifications(&self, agent: AgentId) -> Result<Vec<Notice>, RuntimeError> {
        let slot = self.slot(agent)?;
        let mut state = slot.state.lock();
        Ok(state.executor.take_notices())
    }

    /// The agent's finished actions, oldest first.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAgent`].
    pub fn history(&self, agent: AgentId) -> Result<Vec<HistoryEntry>, RuntimeError> {
        let slot = self.slot(agent)?;
        let state = slot.state.lock();
        Ok(state.executor.history().iter().cloned().collect())
    }
}

fn reason_for(error: &PlanningError) -> String {
    match error {
        PlanningError::NotUnderstood { .. } => "no matching plan".to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    use mason_types::{ActionKind, BlockPos, Task};
    use mason_world::GridWorld;

    use super::*;
    use crate::planner::ScriptedPlanner;

    /// A planner with a bug in it.
    struct Exploding;

    impl Planner for Exploding {
        #[allow(clippy::panic)]
        fn plan(&self, _ctx: &PlanningContext, _command: &str) -> Result<Plan, PlanningError> {
            panic!("index out of range");
        }
    }

    fn runtime(planner: impl Planner + 'static) -> (AgentRuntime, AgentId) {
        let world = GridWorld::new(9);
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::new(0, 1, 0));
        let runtime = AgentRuntime::new(
            Arc::new(world),
            Arc::new(BuildCoordinator::new()),
            Arc::new(planner),
            ExecutorConfig::default(),
        );
        runtime.register_agent(agent, "Mason").unwrap();
        (runtime, agent)
    }

    fn walk(x: i32) -> Plan {
        Plan::new(
            format!("walk to {x}"),
            vec![Task::of(ActionKind::Pathfind).with_position(BlockPos::new(x, 1, 0))],
        )
    }

    #[test]
    fn registration_is_checked() {
        let (runtime, agent) = runtime(ScriptedPlanner::new());
        assert_eq!(
            runtime.register_agent(agent, "Again"),
            Err(RuntimeError::AlreadyRegistered(agent))
        );
        let ghost = AgentId::new();
        assert_eq!(
            runtime.register_agent(ghost, "Ghost"),
            Err(RuntimeError::NotInWorld(ghost))
        );
        assert_eq!(runtime.tick(ghost), Err(RuntimeError::UnknownAgent(ghost)));
        assert_eq!(runtime.agent_named("mason"), Some(agent));
    }

    #[test]
    fn submitted_plan_lands_on_next_tick() {
        let (runtime, agent) = runtime(ScriptedPlanner::new().with("walk", walk(20)));
        runtime.submit(agent, "walk").unwrap();
        // Planned inline (no tokio runtime), but not applied until a tick.
        assert!(runtime.is_executing(agent).unwrap());
        assert_eq!(runtime.current_goal(agent).unwrap(), None);

        runtime.tick(agent).unwrap();
        assert_eq!(runtime.current_goal(agent).unwrap().as_deref(), Some("walk to 20"));
        assert_eq!(runtime.current_action(agent).unwrap().as_deref(), Some("walk to (20, 1, 0)"));
    }

    #[test]
    fn unknown_command_notifies_and_leaves_agent_idle() {
        let (runtime, agent) = runtime(ScriptedPlanner::new());
        runtime.submit(agent, "dance").unwrap();
        runtime.tick(agent).unwrap();
        assert!(!runtime.is_executing(agent).unwrap());
        let notices = runtime.take_notifications(agent).unwrap();
        assert!(matches!(
            notices.as_slice(),
            [Notice::CouldNotUnderstand { command, .. }] if command == "dance"
        ));
    }

    #[test]
    fn later_submit_replaces_earlier_plan() {
        let planner = ScriptedPlanner::new()
            .with("near", walk(3))
            .with("far", walk(40));
        let (runtime, agent) = runtime(planner);
        runtime.submit(agent, "near").unwrap();
        runtime.submit(agent, "far").unwrap();
        runtime.tick(agent).unwrap();
        assert_eq!(runtime.current_goal(agent).unwrap().as_deref(), Some("walk to 40"));
    }

    #[test]
    fn stop_discards_pending_plan() {
        let (runtime, agent) = runtime(ScriptedPlanner::new().with("walk", walk(20)));
        runtime.submit(agent, "walk").unwrap();
        runtime.stop(agent).unwrap();
        assert!(!runtime.is_executing(agent).unwrap());
        runtime.tick(agent).unwrap();
        assert!(!runtime.is_executing(agent).unwrap());
        assert_eq!(runtime.current_goal(agent).unwrap(), None);

        // Idempotent.
        runtime.stop(agent).unwrap();
        runtime.stop(agent).unwrap();
        assert!(!runtime.is_executing(agent).unwrap());
    }

    #[test]
    fn direct_build_skips_the_planner() {
        let (runtime, agent) = runtime(ScriptedPlanner::new());
        runtime.submit(agent, "build platform at 2 0 2").unwrap();
        runtime.tick(agent).unwrap();
        assert_eq!(
            runtime.current_goal(agent).unwrap().as_deref(),
            Some("build platform at (2, 0, 2)")
        );
        assert_eq!(runtime.builds().len(), 1);
    }

    #[test]
    fn late_interrupt_from_superseded_submit_is_ignored() {
        let (runtime, agent) = runtime(ScriptedPlanner::new().with("far", walk(40)));
        let slot = runtime.slot(agent).unwrap();
        // An earlier submit whose interrupt is still in flight.
        let older = slot.next_generation();

        runtime.submit(agent, "far").unwrap();
        slot.send(Inbox::Interrupt { generation: older });
        runtime.tick(agent).unwrap();
        assert_eq!(runtime.current_goal(agent).unwrap().as_deref(), Some("walk to 40"));

        // Arriving after the newer plan is already running changes nothing either.
        slot.send(Inbox::Interrupt { generation: older });
        runtime.tick(agent).unwrap();
        assert_eq!(runtime.current_goal(agent).unwrap().as_deref(), Some("walk to 40"));
        assert!(runtime.is_executing(agent).unwrap());
    }

    #[test]
    fn planner_panic_is_reported_and_settles_the_agent() {
        let (runtime, agent) = runtime(Exploding);
        runtime.submit(agent, "build me a castle").unwrap();
        runtime.tick(agent).unwrap();
        assert!(!runtime.is_executing(agent).unwrap());
        let notices = runtime.take_notifications(agent).unwrap();
        assert!(matches!(
            notices.as_slice(),
            [Notice::CouldNotUnderstand { command, reason }]
                if command == "build me a castle" && reason.contains("panicked")
        ));

        // The agent still takes commands afterwards.
        runtime.submit(agent, "build platform at 2 0 2").unwrap();
        runtime.tick(agent).unwrap();
        assert!(runtime.is_executing(agent).unwrap());
    }

    #[test]
    fn concurrent_submits_settle_on_the_last_command() {
        const COMMANDS: i32 = 60;
        let mut planner = ScriptedPlanner::new();
        for n in 0..=COMMANDS {
            planner = planner.with(&format!("walk {n}"), walk(n.saturating_add(100)));
        }
        let (runtime, agent) = runtime(planner);
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    runtime.tick(agent).unwrap();
                    thread::yield_now();
                }
            });
            scope.spawn(|| {
                for n in 0..COMMANDS {
                    runtime.submit(agent, &format!("walk {n}")).unwrap();
                    if n.checked_rem(7) == Some(3) {
                        runtime.stop(agent).unwrap();
                    }
                    thread::yield_now();
                }
                runtime.stop(agent).unwrap();
                runtime.submit(agent, &format!("walk {COMMANDS}")).unwrap();
                done.store(true, Ordering::Release);
            });
        });
        runtime.tick(agent).unwrap();

        let last_goal = format!("walk to {}", COMMANDS.saturating_add(100));
        assert_eq!(runtime.current_goal(agent).unwrap().as_deref(), Some(last_goal.as_str()));
        assert!(runtime.is_executing(agent).unwrap());

        let accepted: Vec<String> = runtime
            .take_notifications(agent)
            .unwrap()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::PlanAccepted { goal, .. } => Some(goal),
                _ => None,
            })
            .collect();
        let distinct: BTreeSet<&String> = accepted.iter().collect();
        assert_eq!(distinct.len(), accepted.len(), "a plan was applied twice: {accepted:?}");
        assert_eq!(accepted.last(), Some(&last_goal));
    }
}
