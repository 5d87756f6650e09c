//! The per-agent task executor.
//!
//! A [`TaskExecutor`] owns one agent's task queue, its current action, its
//! goal, and the idle fallback. The scheduler calls [`TaskExecutor::tick`]
//! once per period. Each tick:
//!
//! 1. Bumps the counters and, every `defense_check_interval` ticks, runs the
//!    defense check: unless the current action is build, defend, or craft,
//!    a recognized entity nearby that is under attack preempts everything.
//! 2. Returns early if the agent is fully idle, has no idle action running,
//!    and the tick is not an idle re-check boundary.
//! 3. Collects a finished action into the history (surfacing failures that
//!    ask for replanning), or advances an unfinished one and returns.
//! 4. Dequeues and starts the next task once `action_delay_ticks` have
//!    passed since the previous dequeue.
//! 5. Reports the goal complete once its queue has drained.
//! 6. Starts or continues the idle follow while fully idle.
//!
//! The executor is plain data with `&mut self` methods. Callers that drive
//! it from several contexts wrap it in a lock or feed it through a channel.

use std::collections::VecDeque;

use mason_types::{ActionResult, AgentId, Task};
use mason_world::nearest_entity;
use tracing::{debug, info, warn};

use crate::actions::{Action, ActionContext};
use crate::config::{ExecutorConfig, on_interval};
use crate::error::AgentError;
use crate::history::{ActionHistory, HistoryEntry};
use crate::notice::Notice;

/// One agent's task queue, current action, and idle behavior.
#[derive(Debug)]
pub struct TaskExecutor {
    agent: AgentId,
    config: ExecutorConfig,
    current_action: Option<Action>,
    task_queue: VecDeque<Task>,
    current_goal: Option<String>,
    idle_action: Option<Action>,
    ticks_since_last_action: u32,
    tick_count: u64,
    goal_failures: u32,
    history: ActionHistory,
    notices: Vec<Notice>,
}

impl TaskExecutor {
    /// Create an idle executor for `agent`.
    pub fn new(agent: AgentId, config: ExecutorConfig) -> Self {
        let history = ActionHistory::new(config.history_capacity);
        Self {
            agent,
            // The first dequeue after a submit is not held back.
            ticks_since_last_action: config.action_delay_ticks,
            config,
            current_action: None,
            task_queue: VecDeque::new(),
            current_goal: None,
            idle_action: None,
            tick_count: 0,
            goal_failures: 0,
            history,
            notices: Vec::new(),
        }
    }

    // -------------------------------------------------------------------
    // Plans
    // -------------------------------------------------------------------

    /// Replace whatever the agent was doing with a new plan.
    ///
    /// Cancels the current and idle actions and replaces the queue
    /// wholesale. An empty task list is treated as a failed plan.
    pub fn accept_plan(&mut self, command: &str, goal: impl Into<String>, tasks: Vec<Task>) {
        if tasks.is_empty() {
            self.reject_plan(command, "nothing to do");
            return;
        }
        self.cancel_actions();
        let goal = goal.into();
        info!(
            agent = %self.agent,
            goal = %goal,
            tasks = tasks.len(),
            "Plan accepted"
        );
        self.notices.push(Notice::PlanAccepted {
            goal: goal.clone(),
            tasks: tasks.len(),
        });
        self.task_queue = tasks.into();
        self.current_goal = Some(goal);
        self.goal_failures = 0;
        self.ticks_since_last_action = self.config.action_delay_ticks;
    }

    /// Record that planning `command` produced nothing usable. The agent is
    /// left with an empty queue and no goal; nothing is retried.
    pub fn reject_plan(&mut self, command: &str, reason: &str) {
        self.cancel_actions();
        self.task_queue.clear();
        self.current_goal = None;
        warn!(agent = %self.agent, command, reason, "Could not plan command");
        self.notices.push(Notice::CouldNotUnderstand {
            command: command.to_owned(),
            reason: reason.to_owned(),
        });
    }

    /// Cancel the current and idle actions, clear the queue and the goal.
    /// Calling it on an idle executor does nothing.
    pub fn stop(&mut self) {
        let was_busy = self.current_action.is_some()
            || !self.task_queue.is_empty()
            || self.current_goal.is_some();
        self.cancel_actions();
        self.task_queue.clear();
        self.current_goal = None;
        if was_busy {
            info!(agent = %self.agent, "Stopped");
        }
    }

    fn cancel_actions(&mut self) {
        if let Some(mut action) = self.current_action.take() {
            debug!(agent = %self.agent, action = action.description(), "cancelling action");
            action.cancel();
        }
        if let Some(mut idle) = self.idle_action.take() {
            idle.cancel();
        }
    }

    // -------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------

    /// Advance the executor by one scheduler period.
    pub fn tick(&mut self, ctx: &ActionContext<'_>) {
        self.tick_count = self.tick_count.saturating_add(1);
        self.ticks_since_last_action = self.ticks_since_last_action.saturating_add(1);

        if on_interval(self.tick_count, self.config.defense_check_interval) {
            self.check_defense(ctx);
        }

        // An idle agent, following or not, only wakes on the re-check boundary.
        if self.is_idle() && !on_interval(self.tick_count, self.config.idle_check_interval) {
            return;
        }

        if let Some(action) = self.current_action.as_mut() {
            if !action.is_complete() {
                action.tick(ctx);
                return;
            }
            if let Some(finished) = self.current_action.take() {
                self.collect(finished);
            }
        }

        if !self.task_queue.is_empty() {
            if self.ticks_since_last_action >= self.config.action_delay_ticks {
                self.dequeue(ctx);
            }
            return;
        }

        if let Some(goal) = self.current_goal.take() {
            info!(agent = %self.agent, goal = %goal, failures = self.goal_failures, "Goal complete");
            self.notices.push(Notice::GoalComplete {
                goal,
                failures: self.goal_failures,
            });
        }

        self.idle(ctx);
    }

    fn collect(&mut self, action: Action) {
        let kind = action.kind();
        let description = action.description().to_owned();
        let Some(result) = action.into_result() else {
            return;
        };
        debug!(agent = %self.agent, action = %description, %result, "action finished");
        if result.requires_replanning {
            self.surface_failure(&description, &result);
        } else if !result.success {
            self.goal_failures = self.goal_failures.saturating_add(1);
        }
        self.history.record(HistoryEntry {
            tick: self.tick_count,
            kind: Some(kind),
            description,
            result,
        });
    }

    fn surface_failure(&mut self, description: &str, result: &ActionResult) {
        warn!(agent = %self.agent, action = description, message = %result.message, "Action failed");
        self.goal_failures = self.goal_failures.saturating_add(1);
        self.notices.push(Notice::ActionFailed {
            action: description.to_owned(),
            message: result.message.clone(),
        });
    }

    fn dequeue(&mut self, ctx: &ActionContext<'_>) {
        let Some(task) = self.task_queue.pop_front() else {
            return;
        };
        if let Some(mut idle) = self.idle_action.take() {
            idle.cancel();
        }
        self.ticks_since_last_action = 0;

        match Action::from_task(&task) {
            Ok(mut action) => {
                debug!(agent = %self.agent, action = action.description(), "starting action");
                action.start(ctx);
                self.current_action = Some(action);
            }
            Err(AgentError::UnknownActionKind(unknown)) => {
                warn!(agent = %self.agent, task = %task, "{unknown}, dropping task");
            }
            Err(err @ AgentError::InvalidParameters { .. }) => {
                warn!(agent = %self.agent, task = %task, error = %err, "Dropping malformed task");
                let result = ActionResult::failure(err.to_string());
                let description = task.to_string();
                self.surface_failure(&description, &result);
                self.history.record(HistoryEntry {
                    tick: self.tick_count,
                    kind: task.kind().ok(),
                    description,
                    result,
                });
            }
        }
    }

    fn idle(&mut self, ctx: &ActionContext<'_>) {
        if !self.is_idle() {
            if let Some(mut idle) = self.idle_action.take() {
                idle.cancel();
            }
            return;
        }
        let (agent, radius) = (self.agent, self.config.idle_follow_radius);
        let idle = self.idle_action.get_or_insert_with(|| {
            debug!(agent = %agent, "starting idle follow");
            Action::idle_follow(radius)
        });
        idle.start(ctx);
        idle.tick(ctx);
        if idle.is_complete() {
            self.idle_action = None;
        }
    }

    fn check_defense(&mut self, ctx: &ActionContext<'_>) {
        if self
            .current_action
            .as_ref()
            .is_some_and(|a| a.kind().is_preemption_protected())
        {
            return;
        }
        let Some(ward) = nearest_entity(ctx.world, ctx.agent, self.config.defense_radius, |e| {
            e.category.is_recognized()
        }) else {
            return;
        };
        if !ctx.world.is_under_attack(ward.id) {
            return;
        }

        info!(agent = %self.agent, entity = %ward.name, "Defending entity under attack");
        self.cancel_actions();
        self.task_queue.clear();
        let abandoned_goal = self.current_goal.take();
        self.notices.push(Notice::Defending {
            entity: ward.name.clone(),
            abandoned_goal,
        });

        let mut defend = Action::defend(ward.id, &ward.name, self.config.defend_calm_ticks);
        defend.start(ctx);
        self.current_action = Some(defend);
        self.ticks_since_last_action = 0;
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// The agent this executor drives.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Whether an action is running or tasks are queued.
    pub fn is_executing(&self) -> bool {
        self.current_action.is_some() || !self.task_queue.is_empty()
    }

    /// No current action, no queued tasks, and no goal.
    pub fn is_idle(&self) -> bool {
        self.current_action.is_none() && self.task_queue.is_empty() && self.current_goal.is_none()
    }

    /// Whether the idle follow behavior is running.
    pub const fn is_idle_following(&self) -> bool {
        self.idle_action.is_some()
    }

    /// The goal of the current plan.
    pub fn current_goal(&self) -> Option<&str> {
        self.current_goal.as_deref()
    }

    /// The running action.
    pub const fn current_action(&self) -> Option<&Action> {
        self.current_action.as_ref()
    }

    /// Tasks waiting to run.
    pub fn queued_tasks(&self) -> impl Iterator<Item = &Task> {
        self.task_queue.iter()
    }

    /// Finished actions, oldest first.
    pub const fn history(&self) -> &ActionHistory {
        &self.history
    }

    /// Ticks seen so far.
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Drain pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mason_build::BuildCoordinator;
    use mason_types::{ActionKind, BlockPos, EntityCategory, MaterialId};
    use mason_world::{GridWorld, World};

    use super::*;

    struct Fixture {
        world: GridWorld,
        builds: BuildCoordinator,
        agent: AgentId,
    }

    impl Fixture {
        fn new() -> Self {
            let world = GridWorld::new(17);
            let agent = AgentId::new();
            world.add_agent(agent, "Mason", BlockPos::new(0, 1, 0));
            Self {
                world,
                builds: BuildCoordinator::new(),
                agent,
            }
        }

        fn ctx(&self) -> ActionContext<'_> {
            ActionContext {
                agent: self.agent,
                world: &self.world,
                builds: &self.builds,
            }
        }

        fn executor(&self) -> TaskExecutor {
            TaskExecutor::new(self.agent, ExecutorConfig::default())
        }

        fn ticks(&self, executor: &mut TaskExecutor, n: usize) {
            for _ in 0..n {
                executor.tick(&self.ctx());
            }
        }
    }

    fn mine_dirt(quantity: u32) -> Task {
        Task::of(ActionKind::Mine)
            .with("block", "dirt")
            .with("quantity", quantity)
    }

    #[test]
    fn mine_plan_runs_one_action_until_done() {
        let fx = Fixture::new();
        let dirt = MaterialId::new("dirt");
        fx.world
            .fill(BlockPos::new(-2, 0, -2), BlockPos::new(2, 0, 2), &dirt);
        let mut executor = fx.executor();

        executor.accept_plan("mine 10 dirt", "mine 10 dirt", vec![mine_dirt(10)]);
        assert!(executor.is_executing());
        assert_eq!(executor.current_goal(), Some("mine 10 dirt"));

        let mut started = 0;
        let mut ticks = 0;
        while executor.is_executing() && ticks < 100 {
            let before = executor.current_action().is_some();
            executor.tick(&fx.ctx());
            if !before && executor.current_action().is_some() {
                started += 1;
            }
            ticks += 1;
        }

        assert_eq!(started, 1);
        assert!(!executor.is_executing());
        assert_eq!(fx.world.item_count(fx.agent, &dirt), 10);
        let last = executor.history().last().unwrap();
        assert_eq!(last.kind, Some(ActionKind::Mine));
        assert!(last.result.success);

        executor.tick(&fx.ctx());
        assert_eq!(executor.current_goal(), None);
        let notices = executor.take_notices();
        assert!(matches!(notices.first(), Some(Notice::PlanAccepted { tasks: 1, .. })));
        assert!(matches!(notices.last(), Some(Notice::GoalComplete { failures: 0, .. })));
    }

    #[test]
    fn tasks_are_dequeued_in_order_with_delay() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        let tasks = vec![
            Task::of(ActionKind::Spawn).with("entity", "cow"),
            Task::of(ActionKind::Spawn).with("entity", "pig"),
        ];
        executor.accept_plan("spawn animals", "spawn animals", tasks);

        fx.ticks(&mut executor, 1);
        assert_eq!(executor.current_action().map(Action::description), Some("spawn cow"));
        fx.ticks(&mut executor, 1);
        assert!(executor.current_action().is_some_and(Action::is_complete));
        // The delay has elapsed by the time the cow is collected.
        fx.ticks(&mut executor, 1);
        assert_eq!(executor.current_action().map(Action::description), Some("spawn pig"));

        let kinds: Vec<String> = fx
            .world
            .entities_near(BlockPos::new(2, 1, 0), 0)
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec!["cow".to_owned()]);
    }

    #[test]
    fn unknown_kind_is_dropped_and_execution_continues() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        let tasks = vec![
            Task::new("teleport").with("to", "moon"),
            Task::of(ActionKind::Spawn).with("entity", "cow"),
        ];
        executor.accept_plan("go", "go", tasks);

        fx.ticks(&mut executor, 1);
        assert!(executor.current_action().is_none());
        assert_eq!(executor.queued_tasks().count(), 1);
        fx.ticks(&mut executor, 2);
        assert_eq!(executor.current_action().map(Action::kind), Some(ActionKind::Spawn));
        assert!(executor.history().is_empty());
    }

    #[test]
    fn malformed_task_is_recorded_as_failure() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        executor.accept_plan("mine", "mine", vec![Task::of(ActionKind::Mine)]);
        fx.ticks(&mut executor, 1);

        let entry = executor.history().last().unwrap();
        assert!(!entry.result.success);
        assert_eq!(entry.kind, Some(ActionKind::Mine));
        let notices = executor.take_notices();
        assert!(notices.iter().any(|n| matches!(n, Notice::ActionFailed { .. })));
    }

    #[test]
    fn failure_requiring_replanning_is_surfaced_but_queue_continues() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        let tasks = vec![
            Task::of(ActionKind::Craft).with("item", "stone_pickaxe"),
            Task::of(ActionKind::Spawn).with("entity", "cow"),
        ];
        executor.accept_plan("tools", "make tools", tasks);
        fx.ticks(&mut executor, 12);

        let notices = executor.take_notices();
        assert!(notices.iter().any(|n| matches!(n, Notice::ActionFailed { .. })));
        assert!(
            notices
                .iter()
                .any(|n| matches!(n, Notice::GoalComplete { failures: 1, .. }))
        );
        assert_eq!(executor.history().len(), 2);
    }

    #[test]
    fn empty_plan_is_could_not_understand() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        executor.accept_plan("dance", "dance", Vec::new());
        assert!(!executor.is_executing());
        assert_eq!(executor.current_goal(), None);
        assert!(matches!(
            executor.take_notices().as_slice(),
            [Notice::CouldNotUnderstand { .. }]
        ));
    }

    #[test]
    fn new_plan_cancels_the_running_one() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        let far = Task::of(ActionKind::Pathfind).with_position(BlockPos::new(50, 1, 0));
        executor.accept_plan("walk", "walk far", vec![far.clone(), far]);
        fx.ticks(&mut executor, 3);
        assert_eq!(executor.current_action().map(Action::kind), Some(ActionKind::Pathfind));

        executor.accept_plan("spawn", "spawn a cow", vec![Task::of(ActionKind::Spawn).with("entity", "cow")]);
        assert!(executor.current_action().is_none());
        assert_eq!(executor.queued_tasks().count(), 1);
        assert_eq!(executor.current_goal(), Some("spawn a cow"));
    }

    #[test]
    fn stop_is_idempotent() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        executor.accept_plan("walk", "walk", vec![
            Task::of(ActionKind::Pathfind).with_position(BlockPos::new(30, 1, 0)),
        ]);
        fx.ticks(&mut executor, 2);
        executor.stop();
        assert!(!executor.is_executing());
        assert!(executor.is_idle());
        executor.stop();
        assert!(executor.is_idle());
    }

    #[test]
    fn idle_follow_starts_once_and_is_cancelled_by_a_dequeue() {
        let fx = Fixture::new();
        fx.world
            .add_entity("Steve", "player", EntityCategory::Player, BlockPos::new(6, 1, 0), 20);
        let mut executor = fx.executor();

        let mut starts = 0;
        let mut was_following = false;
        for _ in 0..200 {
            executor.tick(&fx.ctx());
            let following = executor.is_idle_following();
            if following && !was_following {
                starts += 1;
            }
            was_following = following;
        }
        assert_eq!(starts, 1);
        assert!(
            fx.world
                .agent_position(fx.agent)
                .unwrap()
                .within(BlockPos::new(6, 1, 0), 2)
        );

        executor.accept_plan("spawn", "spawn", vec![Task::of(ActionKind::Spawn).with("entity", "cow")]);
        assert!(!executor.is_idle_following());
        executor.tick(&fx.ctx());
        assert!(!executor.is_idle_following());
        assert_eq!(executor.current_action().map(Action::kind), Some(ActionKind::Spawn));
    }

    #[test]
    fn idle_agent_does_nothing_between_recheck_boundaries() {
        let fx = Fixture::new();
        let mut executor = fx.executor();
        fx.ticks(&mut executor, 19);
        assert!(!executor.is_idle_following());
        fx.ticks(&mut executor, 1);
        assert!(executor.is_idle_following());
    }

    #[test]
    fn idle_follow_only_steps_on_recheck_boundaries() {
        let fx = Fixture::new();
        fx.world
            .add_entity("Steve", "player", EntityCategory::Player, BlockPos::new(20, 1, 0), 20);
        let mut executor = fx.executor();

        fx.ticks(&mut executor, 20);
        assert!(executor.is_idle_following());
        let after_first_step = fx.world.agent_position(fx.agent).unwrap();
        assert_ne!(after_first_step, BlockPos::new(0, 1, 0));

        for _ in 21..40 {
            executor.tick(&fx.ctx());
            assert!(executor.is_idle());
            assert_eq!(fx.world.agent_position(fx.agent).unwrap(), after_first_step);
        }

        executor.tick(&fx.ctx());
        assert_ne!(fx.world.agent_position(fx.agent).unwrap(), after_first_step);
        assert!(executor.is_idle_following());
    }

    #[test]
    fn defense_preempts_and_clears_the_queue() {
        let fx = Fixture::new();
        let steve = fx
            .world
            .add_entity("Steve", "player", EntityCategory::Player, BlockPos::new(3, 1, 0), 20);
        let mut executor = fx.executor();
        let far = Task::of(ActionKind::Pathfind).with_position(BlockPos::new(0, 1, 60));
        executor.accept_plan("walk", "walk far", vec![far.clone(), far]);
        fx.ticks(&mut executor, 5);
        assert_eq!(executor.current_action().map(Action::kind), Some(ActionKind::Pathfind));

        fx.world.mark_attacked(steve).unwrap();
        fx.ticks(&mut executor, 5);
        assert_eq!(executor.current_action().map(Action::kind), Some(ActionKind::Defend));
        assert_eq!(executor.queued_tasks().count(), 0);
        assert_eq!(executor.current_goal(), None);
        assert!(executor.take_notices().iter().any(|n| matches!(
            n,
            Notice::Defending { abandoned_goal: Some(goal), .. } if goal == "walk far"
        )));
    }

    #[test]
    fn protected_actions_are_never_preempted() {
        let protected = [
            Task::of(ActionKind::Build)
                .with("structure", "wall")
                .with_position(BlockPos::new(40, 0, 40))
                .with("width", 30),
            Task::of(ActionKind::Defend).with("entity", "Alex").with("calm_ticks", 1000),
        ];
        for task in protected {
            let fx = Fixture::new();
            let steve = fx
                .world
                .add_entity("Steve", "player", EntityCategory::Player, BlockPos::new(2, 1, 0), 20);
            fx.world
                .add_entity("Alex", "player", EntityCategory::Player, BlockPos::new(0, 1, 3), 20);
            let mut executor = fx.executor();
            let kind = task.kind().unwrap();
            executor.accept_plan("protected", "protected", vec![task]);
            fx.ticks(&mut executor, 1);
            assert_eq!(executor.current_action().map(Action::kind), Some(kind));

            for _ in 0..6 {
                fx.world.mark_attacked(steve).unwrap();
                fx.ticks(&mut executor, 10);
                assert_eq!(
                    executor.current_action().map(Action::kind),
                    Some(kind),
                    "{kind} was preempted"
                );
            }
        }
    }

    #[test]
    fn protected_craft_is_not_preempted_on_the_check_tick() {
        let fx = Fixture::new();
        let steve = fx
            .world
            .add_entity("Steve", "player", EntityCategory::Player, BlockPos::new(2, 1, 0), 20);
        let mut executor = fx.executor();
        // Eight idle ticks, then the craft starts on the tick before the check.
        fx.ticks(&mut executor, 8);
        executor.accept_plan("craft", "craft", vec![Task::of(ActionKind::Craft).with("item", "stick")]);
        fx.ticks(&mut executor, 1);
        assert_eq!(executor.current_action().map(Action::kind), Some(ActionKind::Craft));

        fx.world.mark_attacked(steve).unwrap();
        fx.ticks(&mut executor, 1);
        assert_eq!(executor.tick_count(), 10);
        assert_eq!(executor.current_action().map(Action::kind), Some(ActionKind::Craft));
    }
}
