//! Tunables for the per-agent task executor.
//!
//! These values live under the `executor` key of `mason-config.yaml`. Every
//! field has a serde default so a partial section only overrides what it
//! names.

use serde::{Deserialize, Serialize};

/// Configuration for [`TaskExecutor`](crate::TaskExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Ticks that must pass after one dequeue before the next task may be
    /// dequeued (default: 2).
    #[serde(default = "default_action_delay_ticks")]
    pub action_delay_ticks: u32,

    /// The defense check runs on every tick that is a multiple of this
    /// (default: 10). Zero disables it.
    #[serde(default = "default_defense_check_interval")]
    pub defense_check_interval: u32,

    /// How far (Chebyshev blocks) the defense check looks for an entity to
    /// protect (default: 16).
    #[serde(default = "default_defense_radius")]
    pub defense_radius: u32,

    /// Consecutive quiet ticks after which a defend action considers its
    /// ward safe (default: 40).
    #[serde(default = "default_defend_calm_ticks")]
    pub defend_calm_ticks: u32,

    /// While fully idle, the executor only wakes on ticks that are a
    /// multiple of this (default: 20). Zero means it never wakes by itself.
    #[serde(default = "default_idle_check_interval")]
    pub idle_check_interval: u32,

    /// Radius within which an idle agent looks for someone to follow
    /// (default: 24).
    #[serde(default = "default_idle_follow_radius")]
    pub idle_follow_radius: u32,

    /// Finished actions kept in the history (default: 50).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

const fn default_action_delay_ticks() -> u32 {
    2
}

const fn default_defense_check_interval() -> u32 {
    10
}

const fn default_defense_radius() -> u32 {
    16
}

const fn default_defend_calm_ticks() -> u32 {
    40
}

const fn default_idle_check_interval() -> u32 {
    20
}

const fn default_idle_follow_radius() -> u32 {
    24
}

const fn default_history_capacity() -> usize {
    50
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            action_delay_ticks: default_action_delay_ticks(),
            defense_check_interval: default_defense_check_interval(),
            defense_radius: default_defense_radius(),
            defend_calm_ticks: default_defend_calm_ticks(),
            idle_check_interval: default_idle_check_interval(),
            idle_follow_radius: default_idle_follow_radius(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Whether `tick` lands on a multiple of `interval`. A zero interval never
/// matches.
pub(crate) fn on_interval(tick: u64, interval: u32) -> bool {
    tick.checked_rem(u64::from(interval)) == Some(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ExecutorConfig::default();
        assert_eq!(config.action_delay_ticks, 2);
        assert_eq!(config.defense_check_interval, 10);
        assert_eq!(config.idle_check_interval, 20);
        assert_eq!(config.history_capacity, 50);
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let config: ExecutorConfig =
            serde_json::from_str(r#"{"action_delay_ticks": 0}"#).unwrap_or_default();
        assert_eq!(config.action_delay_ticks, 0);
        assert_eq!(config.defense_radius, 16);
    }

    #[test]
    fn zero_interval_never_fires() {
        assert!(!on_interval(0, 0));
        assert!(!on_interval(10, 0));
        assert!(on_interval(20, 10));
        assert!(!on_interval(21, 10));
    }
}
