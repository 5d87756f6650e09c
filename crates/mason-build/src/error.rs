//! Error types for the `mason-build` crate.

/// Errors that can occur when creating or planning a build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A build needs at least one placement.
    #[error("build plan for {structure} is empty")]
    EmptyPlan {
        /// The structure kind that was requested.
        structure: String,
    },

    /// No blueprint exists for the structure kind.
    #[error("unknown structure: {0}")]
    UnknownStructure(String),

    /// Blueprint dimensions are out of range.
    #[error("invalid dimensions for {structure}: {reason}")]
    InvalidDimensions {
        /// The structure kind.
        structure: String,
        /// Why the dimensions were rejected.
        reason: String,
    },
}
