//! Error types for reconciliation.

use thiserror::Error;

use crate::apply::{ApplyError, FailureCause};
use crate::plan::PlanError;
use crate::setting::SettingName;

/// Error type for a reconciliation or destroy pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Desired settings name the same setting twice.
    #[error("Invalid configuration: duplicate setting name '{name}'")]
    DuplicateSetting {
        /// The repeated name.
        name: SettingName,
    },

    /// The planner rejected its input.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Reading observed settings failed.
    #[error("Failed to describe '{resource}': {cause}")]
    Describe {
        /// Parameter set identifier.
        resource: String,
        /// Underlying failure.
        #[source]
        cause: FailureCause,
    },

    /// Creating a missing parameter set failed.
    #[error("Failed to create '{resource}': {cause}")]
    Create {
        /// Parameter set identifier.
        resource: String,
        /// Underlying failure.
        #[source]
        cause: FailureCause,
    },

    /// Setting drifted values failed.
    #[error("Failed to apply settings: {0}")]
    Apply(#[source] ApplyError),

    /// Resetting removed settings failed.
    #[error("Failed to reset removed settings: {0}")]
    Reset(#[source] ApplyError),

    /// Deleting the parameter set failed.
    #[error("Failed to delete '{resource}': {cause}")]
    Delete {
        /// Parameter set identifier.
        resource: String,
        /// Underlying failure.
        #[source]
        cause: FailureCause,
    },
}

impl ReconcileError {
    /// Returns true if the error stems from invalid input rather than from
    /// the remote side.
    #[must_use]
    pub const fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::DuplicateSetting { .. } | Self::Plan(_))
    }

    /// Returns the failure cause reported by the remote side, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Describe { cause, .. }
            | Self::Create { cause, .. }
            | Self::Delete { cause, .. } => Some(cause),
            Self::Apply(error) | Self::Reset(error) => Some(&error.cause),
            Self::DuplicateSetting { .. } | Self::Plan(_) => None,
        }
    }
}
