//! Configuration layer for paramsync.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Desired-state file parsing ([`Desired`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! Headers are merged: TOML headers are applied first and CLI headers with
//! the same name replace them. A bearer token always wins over an explicit
//! `Authorization` header.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some options are TOML-only (not available via CLI):
//! - `retry.max_delay_ms`, `retry.multiplier`, `retry.jitter`
//! - the whole `[coupling]` section
//!
//! Setting `coupling.groups` replaces the built-in groups; family groups are
//! always added on top of whichever default groups are in effect.

mod cli;
pub mod defaults;
mod desired;
mod error;
mod paths;
mod toml;
mod validated;

#[cfg(test)]
mod desired_tests;
#[cfg(test)]
mod toml_tests;
#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, CoupledPackingArg, FreeOrderArg};
pub use desired::Desired;
pub use error::{ConfigError, field};
pub use paths::expand_tilde;
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
