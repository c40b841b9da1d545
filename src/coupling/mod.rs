//! Coupling knowledge base.
//!
//! Some remote APIs reject a change to one setting unless a related setting
//! is changed in the same call (a character set and its matching collation,
//! or the lower and upper bounds of a protocol range). This module models
//! those rules as injected data:
//!
//! - [`CoupledGroup`]: one set of names that must travel together
//! - [`CouplingTable`]: groups keyed by engine family, plus groups that
//!   apply to every family
//! - [`CouplingRules`]: the effective, resolved rules for one family

mod table;

#[cfg(test)]
mod table_tests;

pub use table::{CoupledGroup, CouplingError, CouplingRules, CouplingTable};
