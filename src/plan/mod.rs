//! Chunk planner.
//!
//! Turns an ordered list of changed settings into an ordered sequence of
//! bounded-size [`Chunk`]s, each submitted in one remote call:
//!
//! - Coupled settings (two or more members of the same coupling group
//!   present) are never split and are emitted first, members in ascending
//!   name order.
//! - Free settings keep their presentation order and are packed up to the
//!   size bound.
//! - A coupled group larger than the bound is emitted whole and flagged
//!   [`Chunk::is_oversized`].
//!
//! The planner is pure and synchronous; [`Planner`] is `Send + Sync` and
//! can be shared by concurrent reconciliation passes.

mod chunk;
mod error;
mod planner;


pub use chunk::Chunk;
pub use error::PlanError;
pub use planner::{Chunks, CoupledPacking, FreeOrder, Planner, PlannerPolicy, plan};
