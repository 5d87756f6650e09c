//! Configuration loading and typed config structures for Mason.
//!
//! The canonical configuration lives in `mason-config.yaml` at the project
//! root. Every section and field has a default, so an empty file (or no
//! file at all) yields a runnable configuration.

use std::path::Path;

use mason_agents::ExecutorConfig;
use serde::Deserialize;
use tracing::warn;

/// Environment variable that overrides `runtime.tick_interval_ms`.
pub const TICK_INTERVAL_ENV: &str = "MASON_TICK_INTERVAL_MS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors `mason-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MasonConfig {
    /// Scheduler settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Per-agent executor tunables.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Collaborative build housekeeping.
    #[serde(default)]
    pub build: BuildConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scenario the engine binary sets up.
    #[serde(default)]
    pub demo: DemoConfig,
}

impl MasonConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `MASON_TICK_INTERVAL_MS` overrides `runtime.tick_interval_ms` when
    /// set to a valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.runtime.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    /// Real-time milliseconds between executor ticks (default: 50, i.e.
    /// 20 ticks per second).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default)]
    pub max_ticks: u64,
}

impl RuntimeConfig {
    /// Apply overrides from a variable lookup (normally the process
    /// environment). Unparseable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let Some(raw) = lookup(TICK_INTERVAL_ENV) else {
            return;
        };
        match raw.trim().parse::<u64>() {
            Ok(ms) => self.tick_interval_ms = ms,
            Err(e) => warn!(
                variable = TICK_INTERVAL_ENV,
                value = %raw,
                error = %e,
                "Ignoring invalid tick interval override"
            ),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Collaborative build housekeeping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    /// Completed builds are swept from the registry every this many ticks
    /// (default: 200). Zero disables the sweep.
    #[serde(default = "default_cleanup_interval_ticks")]
    pub cleanup_interval_ticks: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_ticks: default_cleanup_interval_ticks(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (default: `info`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// The scenario the engine binary runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// World RNG seed.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Agent names, spawned a few blocks apart.
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,

    /// Commands submitted during the run.
    #[serde(default = "default_commands")]
    pub commands: Vec<DemoCommand>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            agents: default_agents(),
            commands: default_commands(),
        }
    }
}

/// One scripted command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoCommand {
    /// Tick at which the command is submitted.
    #[serde(default)]
    pub at_tick: u64,
    /// Name of the agent receiving the command.
    pub agent: String,
    /// The command text.
    pub command: String,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_cleanup_interval_ticks() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_seed() -> u64 {
    42
}

fn default_agents() -> Vec<String> {
    vec!["Ada".to_owned(), "Bo".to_owned()]
}

fn default_commands() -> Vec<DemoCommand> {
    vec![
        DemoCommand {
            at_tick: 1,
            agent: "Ada".to_owned(),
            command: "build house at 8 0 8".to_owned(),
        },
        DemoCommand {
            at_tick: 20,
            agent: "Bo".to_owned(),
            command: "build house".to_owned(),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MasonConfig::default();
        assert_eq!(config.runtime.tick_interval_ms, 50);
        assert_eq!(config.runtime.max_ticks, 0);
        assert_eq!(config.executor.defense_check_interval, 10);
        assert_eq!(config.build.cleanup_interval_ticks, 200);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.demo.agents.len(), 2);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
runtime:
  tick_interval_ms: 100
  max_ticks: 500

executor:
  action_delay_ticks: 1
  defense_check_interval: 5
  defense_radius: 8
  defend_calm_ticks: 20
  idle_check_interval: 10
  idle_follow_radius: 12
  history_capacity: 5

build:
  cleanup_interval_ticks: 50

logging:
  level: "debug"
  json: true

demo:
  seed: 7
  agents: [Cy]
  commands:
    - at_tick: 3
      agent: Cy
      command: "mine 4 dirt"
"#;
        let config = MasonConfig::parse(yaml).unwrap();
        assert_eq!(config.runtime.max_ticks, 500);
        assert_eq!(config.executor.action_delay_ticks, 1);
        assert_eq!(config.executor.history_capacity, 5);
        assert_eq!(config.build.cleanup_interval_ticks, 50);
        assert!(config.logging.json);
        assert_eq!(config.demo.seed, 7);
        assert_eq!(config.demo.commands.first().map(|c| c.at_tick), Some(3));
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = MasonConfig::parse("executor:\n  defense_radius: 4\n").unwrap();
        assert_eq!(config.executor.defense_radius, 4);
        // Everything else uses defaults
        assert_eq!(config.executor.action_delay_ticks, 2);
        assert_eq!(config.build.cleanup_interval_ticks, 200);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(MasonConfig::parse("").is_ok());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = MasonConfig::parse("runtime: [1, 2");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn tick_interval_override() {
        let mut runtime = RuntimeConfig::default();
        runtime.apply_overrides(|key| (key == TICK_INTERVAL_ENV).then(|| "25".to_owned()));
        assert_eq!(runtime.tick_interval_ms, 25);

        runtime.apply_overrides(|_key| Some("fast".to_owned()));
        assert_eq!(runtime.tick_interval_ms, 25);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("mason-config.yaml");
        if path.exists() {
            let config = MasonConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
