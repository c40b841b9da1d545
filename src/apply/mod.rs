//! Apply coordination: submitting planned chunks to the control plane.
//!
//! This module provides:
//! - The [`Coordinator`] that submits chunks in order with retry, timeout
//!   and cancellation
//! - The [`RetryPolicy`] for transient failures
//! - Observable pass state ([`ApplyState`])
//! - Outcome types ([`Applied`], [`ApplyError`], [`FailureCause`])

mod coordinator;
mod error;
mod retry;
mod state;

#[cfg(test)]
mod coordinator_tests;

pub use coordinator::{Applied, Coordinator, DEFAULT_SUBMIT_TIMEOUT};
pub use error::{ApplyError, FailureCause};
pub use retry::RetryPolicy;
pub use state::ApplyState;
