//! Planner-produced tasks.
//!
//! A [`Task`] names an action kind and carries a free-form parameter map.
//! The kind is kept as the planner wrote it and resolved to an
//! [`ActionKind`] only at dispatch, so an unrecognized kind survives until
//! the executor can log and drop it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{ActionKind, UnknownActionKind};
use crate::geometry::BlockPos;

/// Errors raised when reading a typed parameter out of a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskParamError {
    /// A required parameter is absent.
    #[error("missing parameter `{0}`")]
    Missing(String),

    /// A parameter is present but has the wrong shape.
    #[error("parameter `{key}` is invalid: expected {expected}")]
    Invalid {
        /// The parameter name.
        key: String,
        /// What the reader expected to find.
        expected: &'static str,
    },
}

/// One unit of planned work: an action kind plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Action kind name as produced by the planner (e.g. `"mine"`).
    pub action: String,
    /// Action-specific parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl Task {
    /// Create a task with no parameters.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Create a task for a known action kind.
    pub fn of(kind: ActionKind) -> Self {
        Self::new(kind.as_str())
    }

    /// Builder-style parameter insertion.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Builder-style insertion of `x`, `y`, `z` parameters.
    #[must_use]
    pub fn with_position(self, pos: BlockPos) -> Self {
        self.with("x", pos.x).with("y", pos.y).with("z", pos.z)
    }

    /// Resolve the action kind against the closed capability set.
    pub fn kind(&self) -> Result<ActionKind, UnknownActionKind> {
        self.action.parse()
    }

    /// Raw parameter lookup.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// Required string parameter.
    pub fn str_param(&self, key: &str) -> Result<&str, TaskParamError> {
        match self.param(key) {
            None | Some(Value::Null) => Err(TaskParamError::Missing(key.to_owned())),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
            Some(_) => Err(TaskParamError::Invalid {
                key: key.to_owned(),
                expected: "a non-empty string",
            }),
        }
    }

    /// Optional string parameter. Present-but-wrong-shape values are an error.
    pub fn opt_str_param(&self, key: &str) -> Result<Option<&str>, TaskParamError> {
        match self.str_param(key) {
            Ok(s) => Ok(Some(s)),
            Err(TaskParamError::Missing(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Optional signed integer parameter. Numeric strings are accepted
    /// because planners frequently quote numbers.
    pub fn opt_i64_param(&self, key: &str) -> Result<Option<i64>, TaskParamError> {
        let invalid = || TaskParamError::Invalid {
            key: key.to_owned(),
            expected: "an integer",
        };
        match self.param(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(invalid),
            Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_err| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    /// Optional `i32` parameter.
    pub fn opt_i32_param(&self, key: &str) -> Result<Option<i32>, TaskParamError> {
        self.opt_i64_param(key)?
            .map(|v| {
                i32::try_from(v).map_err(|_err| TaskParamError::Invalid {
                    key: key.to_owned(),
                    expected: "a 32-bit integer",
                })
            })
            .transpose()
    }

    /// Optional non-negative `u32` parameter.
    pub fn opt_u32_param(&self, key: &str) -> Result<Option<u32>, TaskParamError> {
        self.opt_i64_param(key)?
            .map(|v| {
                u32::try_from(v).map_err(|_err| TaskParamError::Invalid {
                    key: key.to_owned(),
                    expected: "a non-negative integer",
                })
            })
            .transpose()
    }

    /// `u32` parameter with a default when absent.
    pub fn u32_param_or(&self, key: &str, default: u32) -> Result<u32, TaskParamError> {
        Ok(self.opt_u32_param(key)?.unwrap_or(default))
    }

    /// Optional position read from the `x`, `y`, `z` parameters. Either all
    /// three are present or none.
    pub fn opt_position(&self) -> Result<Option<BlockPos>, TaskParamError> {
        let x = self.opt_i32_param("x")?;
        let y = self.opt_i32_param("y")?;
        let z = self.opt_i32_param("z")?;
        match (x, y, z) {
            (Some(x), Some(y), Some(z)) => Ok(Some(BlockPos::new(x, y, z))),
            (None, None, None) => Ok(None),
            (None, _, _) => Err(TaskParamError::Missing("x".to_owned())),
            (_, None, _) => Err(TaskParamError::Missing("y".to_owned())),
            (_, _, None) => Err(TaskParamError::Missing("z".to_owned())),
        }
    }

    /// Required position read from `x`, `y`, `z`.
    pub fn position(&self) -> Result<BlockPos, TaskParamError> {
        self.opt_position()?
            .ok_or_else(|| TaskParamError::Missing("x".to_owned()))
    }
}

impl core::fmt::Display for Task {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.action)?;
        if !self.parameters.is_empty() {
            let rendered: Vec<String> = self
                .parameters
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, " {{{}}}", rendered.join(", "))?;
        }
        Ok(())
    }
}
