//! Reconciliation of desired parameter sets against the control plane.
//!
//! This module provides:
//! - Drift computation between desired and observed settings ([`diff`])
//! - The [`Reconciler`] driving a full pass (describe, create, plan,
//!   apply, reset) and destroy

mod diff;
mod error;
mod reconciler;


pub use diff::{Drift, diff};
pub use error::ReconcileError;
pub use reconciler::{DestroyOutcome, Preview, Reconciler, Report};
