//! Planning, agent runtime, and the tick loop for Mason.
//!
//! This crate wires the per-agent executors from `mason-agents` to a
//! planner, a world, and a shared build registry, and drives them at a
//! fixed rate.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `mason-config.yaml` into
//!   strongly-typed structs.
//! - [`planner`] -- [`Planner`] trait, [`Plan`], and [`ScriptedPlanner`].
//! - [`rules`] -- [`RulePlanner`], a verb-table planner for the demo.
//! - [`direct`] -- Direct `build <structure> x y z` commands.
//! - [`runtime`] -- [`AgentRuntime`]: submit, tick, stop, and queries.
//! - [`runner`] -- The fixed-rate loop with run controls.
//!
//! [`Planner`]: planner::Planner
//! [`Plan`]: planner::Plan
//! [`ScriptedPlanner`]: planner::ScriptedPlanner
//! [`RulePlanner`]: rules::RulePlanner
//! [`AgentRuntime`]: runtime::AgentRuntime

pub mod config;
pub mod direct;
pub mod planner;
pub mod rules;
pub mod runner;
pub mod runtime;
