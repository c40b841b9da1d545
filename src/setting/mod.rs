//! Data model for parameter reconciliation.
//!
//! This module provides types for:
//! - Case-insensitive setting identity ([`SettingName`])
//! - A single named value with its apply semantics ([`Setting`])
//! - Apply timing and provenance ([`ApplyTiming`], [`SettingSource`])
//! - The collection attached to one managed resource ([`ParameterSet`])

mod name;
mod parameter_set;
mod value;


pub use name::SettingName;
pub use parameter_set::{DEFAULT_DESCRIPTION, ParameterSet, find_duplicate};
pub use value::{ApplyTiming, ParseEnumError, Setting, SettingSource};
