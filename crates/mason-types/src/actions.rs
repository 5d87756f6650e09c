//! The outcome of a finished action.

use serde::{Deserialize, Serialize};

/// Result of an action once it reports completion.
///
/// By default a failure asks the caller to replan and a success does not.
/// [`with_replanning`](Self::with_replanning) overrides that. The same
/// default applies when a serialized result omits `requires_replanning`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredActionResult")]
pub struct ActionResult {
    /// Whether the action achieved what it set out to do.
    pub success: bool,
    /// Human-readable summary for the history and notifications.
    pub message: String,
    /// Whether the failure invalidates the rest of the plan.
    pub requires_replanning: bool,
}

/// Wire form of [`ActionResult`] with the replanning flag optional.
#[derive(Deserialize)]
struct StoredActionResult {
    success: bool,
    message: String,
    #[serde(default)]
    requires_replanning: Option<bool>,
}

impl From<StoredActionResult> for ActionResult {
    fn from(stored: StoredActionResult) -> Self {
        Self {
            success: stored.success,
            message: stored.message,
            requires_replanning: stored.requires_replanning.unwrap_or(!stored.success),
        }
    }
}

impl ActionResult {
    /// Successful result.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            requires_replanning: false,
        }
    }

    /// Failed result that asks for replanning.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            requires_replanning: true,
        }
    }

    /// Override the replanning flag.
    #[must_use]
    pub const fn with_replanning(mut self, requires_replanning: bool) -> Self {
        self.requires_replanning = requires_replanning;
        self
    }
}

impl core::fmt::Display for ActionResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(f, "[{status}] {}", self.message)
    }
}
