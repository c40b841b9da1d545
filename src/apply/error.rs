//! Error types for chunk submission.

use thiserror::Error;

use crate::remote::RemoteError;
use crate::setting::SettingName;

/// Why a submission was given up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// Every attempt failed transiently.
    #[error("Gave up after {attempts} attempt(s): {last}")]
    Transient {
        /// Attempts made, the first one included.
        attempts: u32,
        /// Message of the last transient error.
        last: String,
    },

    /// The remote rejected the request.
    #[error("Rejected by remote: {0}")]
    Validation(String),

    /// The parameter set does not exist.
    #[error("Parameter set '{0}' not found")]
    NotFound(String),

    /// The cancellation token fired before the submission could complete.
    #[error("Cancelled")]
    Cancelled,
}

impl FailureCause {
    /// Converts a terminal remote error observed after `attempts` attempts.
    #[must_use]
    pub fn from_remote(error: RemoteError, attempts: u32) -> Self {
        match error {
            RemoteError::Transient(last) => Self::Transient { attempts, last },
            RemoteError::Validation(message) => Self::Validation(message),
            RemoteError::NotFound(resource) => Self::NotFound(resource),
        }
    }

    /// Returns true for [`FailureCause::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A chunk could not be submitted; later chunks were not attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Chunk {chunk_index} [{}] failed: {cause}", join(.names))]
pub struct ApplyError {
    /// Position of the failing chunk in submission order (0-based).
    pub chunk_index: usize,
    /// Setting names in the failing chunk.
    pub names: Vec<SettingName>,
    /// What went wrong.
    #[source]
    pub cause: FailureCause,
}

fn join(names: &[SettingName]) -> String {
    names
        .iter()
        .map(SettingName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
