//! Error types for chunk planning.

use thiserror::Error;

use crate::setting::SettingName;

/// Planning failure.
///
/// Every variant is an invalid-configuration error: it is reported
/// synchronously, before any remote call, and is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The maximum chunk size must be positive.
    #[error("Invalid configuration: max chunk size must be greater than 0")]
    ZeroChunkSize,

    /// The same setting name (ignoring case) appears more than once.
    #[error("Invalid configuration: duplicate setting name '{name}'")]
    DuplicateSetting {
        /// The repeated name, as spelled at its second occurrence
        name: SettingName,
    },
}
