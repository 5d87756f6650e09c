//! Tick loop runner with run controls.
//!
//! [`run`] drives [`AgentRuntime::tick_all`] at a fixed rate with support
//! for:
//!
//! - **Bounded runs**: stop after `max_ticks`
//! - **Pause/resume**: halt and continue the loop without losing state
//! - **Variable tick speed**: interval adjustable while running
//! - **Stop requests**: clean exit at the next tick boundary
//!
//! Between agent ticks the loop advances the world's own simulation through
//! a caller-supplied [`TickObserver`] and sweeps finished builds out of the
//! registry every `cleanup_interval_ticks`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::config::{BuildConfig, RuntimeConfig};
use crate::runtime::AgentRuntime;

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// [`RunControl::request_stop`] was called.
    StopRequested,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Why the loop ended.
    pub end_reason: RunEndReason,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Completed builds swept from the registry during the run.
    pub builds_cleaned: usize,
}

/// Called once per tick after every agent has been ticked.
pub trait TickObserver: Send {
    /// `tick` is 1-based.
    fn on_tick(&mut self, tick: u64, runtime: &AgentRuntime);
}

/// An observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl TickObserver for NoOpObserver {
    fn on_tick(&mut self, _tick: u64, _runtime: &AgentRuntime) {}
}

/// Shared run control state.
///
/// Wrapped in [`Arc`] and shared between the loop and whoever controls it.
/// Atomic fields keep reads on the loop's hot path lock-free.
#[derive(Debug)]
pub struct RunControl {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    tick_interval_ms: AtomicU64,
    max_ticks: u64,
    started_at: DateTime<Utc>,
}

impl RunControl {
    /// Create run controls from configuration.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(config.tick_interval_ms),
            max_ticks: config.max_ticks,
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop. It sleeps until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to return at the next tick boundary. Also wakes a
    /// paused loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Speed and limits
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval. Returns the previous value.
    pub fn set_tick_interval_ms(&self, ms: u64) -> u64 {
        self.tick_interval_ms.swap(ms, Ordering::AcqRel)
    }

    /// Whether `tick` has reached the limit. A limit of 0 means unlimited.
    pub const fn tick_limit_reached(&self, tick: u64) -> bool {
        self.max_ticks > 0 && tick >= self.max_ticks
    }

    /// The configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Wall-clock time the controls were created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Run the tick loop until a termination condition is met.
pub async fn run(
    runtime: &AgentRuntime,
    control: &Arc<RunControl>,
    build: &BuildConfig,
    observer: &mut dyn TickObserver,
) -> RunResult {
    let mut total_ticks: u64 = 0;
    let mut builds_cleaned: usize = 0;

    info!(
        agents = runtime.agents().len(),
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        "Run starting"
    );

    let end_reason = loop {
        if control.is_paused() {
            info!("Run paused, waiting for resume...");
            control.wait_if_paused().await;
            info!("Run resumed");
        }
        if control.is_stop_requested() {
            info!("Stop requested");
            break RunEndReason::StopRequested;
        }

        total_ticks = total_ticks.saturating_add(1);
        let ticked = runtime.tick_all();
        observer.on_tick(total_ticks, runtime);

        if build.cleanup_interval_ticks > 0
            && total_ticks.checked_rem(build.cleanup_interval_ticks) == Some(0)
        {
            let removed = runtime.builds().cleanup_completed_builds();
            builds_cleaned = builds_cleaned.saturating_add(removed);
            if removed > 0 {
                debug!(tick = total_ticks, removed, "swept completed builds");
            }
        }

        if control.tick_limit_reached(total_ticks) {
            info!(tick = total_ticks, agents = ticked, "Tick limit reached");
            break RunEndReason::MaxTicksReached;
        }

        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    };

    let result = RunResult {
        end_reason,
        total_ticks,
        builds_cleaned,
    };
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        builds_cleaned = result.builds_cleaned,
        "Run ended"
    );
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mason_agents::ExecutorConfig;
    use mason_build::BuildCoordinator;
    use mason_types::{AgentId, BlockPos};
    use mason_world::GridWorld;

    use super::*;
    use crate::planner::ScriptedPlanner;

    fn runtime() -> (AgentRuntime, AgentId) {
        let world = GridWorld::new(4);
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::new(0, 1, 0));
        let runtime = AgentRuntime::new(
            Arc::new(world),
            Arc::new(BuildCoordinator::new()),
            Arc::new(ScriptedPlanner::new()),
            ExecutorConfig::default(),
        );
        runtime.register_agent(agent, "Mason").unwrap();
        (runtime, agent)
    }

    fn control(max_ticks: u64) -> Arc<RunControl> {
        Arc::new(RunControl::new(&RuntimeConfig {
            tick_interval_ms: 0,
            max_ticks,
        }))
    }

    struct Counter(u64);

    impl TickObserver for Counter {
        fn on_tick(&mut self, tick: u64, _runtime: &AgentRuntime) {
            assert_eq!(tick, self.0.saturating_add(1));
            self.0 = tick;
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let (runtime, _) = runtime();
        let mut counter = Counter(0);
        let result = run(&runtime, &control(5), &BuildConfig::default(), &mut counter).await;
        assert_eq!(result.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(counter.0, 5);
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let (runtime, _) = runtime();
        let control = control(0);
        control.request_stop();
        let result = run(&runtime, &control, &BuildConfig::default(), &mut NoOpObserver).await;
        assert_eq!(result.end_reason, RunEndReason::StopRequested);
        assert_eq!(result.total_ticks, 0);
    }

    #[tokio::test]
    async fn completed_builds_are_swept() {
        let (runtime, agent) = runtime();
        runtime.submit(agent, "build platform at 1 0 1").unwrap();
        let build = BuildConfig {
            cleanup_interval_ticks: 10,
        };
        let result = run(&runtime, &control(200), &build, &mut NoOpObserver).await;
        assert_eq!(result.total_ticks, 200);
        assert!(runtime.builds().is_empty());
        assert!(!runtime.is_executing(agent).unwrap());
    }

    #[test]
    fn interval_is_adjustable() {
        let control = control(0);
        assert_eq!(control.set_tick_interval_ms(250), 0);
        assert_eq!(control.tick_interval_ms(), 250);
        assert!(!control.tick_limit_reached(u64::MAX));
    }

    #[test]
    fn pause_and_resume() {
        let control = control(0);
        control.pause();
        assert!(control.is_paused());
        control.resume();
        assert!(!control.is_paused());
    }
}
