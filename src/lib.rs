//! paramsync: parameter set reconciliation
//!
//! A library for bringing a remote database parameter set in line with a
//! desired state, submitting changes in bounded chunks that keep coupled
//! settings together and retrying transient control plane failures.
//!
//! The pieces, bottom-up:
//! - [`setting`]: the data model
//! - [`coupling`]: which settings must travel together
//! - [`plan`]: the chunk planner
//! - [`remote`]: the control plane boundary and its adapters
//! - [`apply`]: the apply coordinator with retry and cancellation
//! - [`reconcile`]: drift detection and full reconciliation passes
//! - [`config`]: CLI, configuration file and desired-state file

pub mod apply;
pub mod config;
pub mod coupling;
pub mod plan;
pub mod reconcile;
pub mod remote;
pub mod setting;
pub mod time;
