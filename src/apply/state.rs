//! Progress of an apply pass.

use std::fmt;

/// Observable state of the coordinator's current pass.
///
/// Transitions: `Planned → Applying → (Applied | Failed)`. `Applying` is
/// published once per chunk, before its first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyState {
    /// No chunk submitted yet.
    #[default]
    Planned,
    /// Chunk `index` (0-based) of `total` is being submitted.
    Applying {
        /// Current chunk position.
        index: usize,
        /// Chunks in the pass.
        total: usize,
    },
    /// Every chunk was accepted.
    Applied,
    /// Chunk `index` failed; the pass stopped there.
    Failed {
        /// Failing chunk position.
        index: usize,
    },
}

impl ApplyState {
    /// Returns true once the pass has finished either way.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied | Self::Failed { .. })
    }
}

impl fmt::Display for ApplyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planned => write!(f, "planned"),
            Self::Applying { index, total } => {
                write!(f, "applying chunk {} of {total}", index + 1)
            }
            Self::Applied => write!(f, "applied"),
            Self::Failed { index } => write!(f, "failed at chunk {}", index + 1),
        }
    }
}
