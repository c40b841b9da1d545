//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::plan::{CoupledPacking, FreeOrder};

use super::defaults;

/// paramsync: parameter set reconciliation
///
/// Brings a remote database parameter set in line with a desired-state
/// file, submitting changes in bounded batches that keep coupled settings
/// together.
#[derive(Debug, Parser)]
#[command(name = "paramsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Control plane base URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Bearer token for Authorization header
    #[arg(long, global = true)]
    pub bearer: Option<String>,

    /// HTTP headers in 'Key=Value' or 'Key: Value' format (can be specified multiple times)
    #[arg(long = "header", value_name = "K=V", global = true)]
    pub headers: Vec<String>,

    /// Per-call timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum number of settings per remote call
    #[arg(long = "max-chunk-size", global = true)]
    pub max_chunk_size: Option<usize>,

    /// How coupled groups share chunks
    #[arg(long = "coupled-packing", value_enum, global = true)]
    pub coupled_packing: Option<CoupledPackingArg>,

    /// Order in which uncoupled settings are packed
    #[arg(long = "free-order", value_enum, global = true)]
    pub free_order: Option<FreeOrderArg>,

    /// Maximum number of attempts per remote call
    #[arg(long = "retry-max", global = true)]
    pub retry_max: Option<u32>,

    /// Initial retry delay in milliseconds
    #[arg(long = "retry-delay", value_name = "MS", global = true)]
    pub retry_delay: Option<u64>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for paramsync
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the chunks an apply would submit, without changing anything
    Plan {
        /// Desired-state file
        desired: PathBuf,

        /// Plan against an empty remote instead of describing the live one
        #[arg(long)]
        offline: bool,
    },

    /// Reconcile the remote parameter set with the desired-state file
    Apply {
        /// Desired-state file
        desired: PathBuf,
    },

    /// Delete the remote parameter set
    Destroy {
        /// Desired-state file naming the parameter set
        desired: PathBuf,

        /// Keep the remote parameter set and only report it as retained
        #[arg(long)]
        retain: bool,
    },
}

impl Command {
    /// Returns the desired-state file path, if the command takes one.
    #[must_use]
    pub fn desired_path(&self) -> Option<&Path> {
        match self {
            Self::Init { .. } => None,
            Self::Plan { desired, .. } | Self::Apply { desired } | Self::Destroy { desired, .. } => {
                Some(desired)
            }
        }
    }

    /// Returns true if the command needs to reach the control plane.
    #[must_use]
    pub const fn needs_remote(&self) -> bool {
        match self {
            Self::Init { .. } => false,
            Self::Plan { offline, .. } => !*offline,
            Self::Apply { .. } | Self::Destroy { .. } => true,
        }
    }
}

/// Coupled packing argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoupledPackingArg {
    /// One chunk per coupled group
    #[value(name = "isolated")]
    Isolated,
    /// Pack coupled groups and top up with free settings
    #[value(name = "fill")]
    Fill,
}

impl From<CoupledPackingArg> for CoupledPacking {
    fn from(arg: CoupledPackingArg) -> Self {
        match arg {
            CoupledPackingArg::Isolated => Self::Isolated,
            CoupledPackingArg::Fill => Self::Fill,
        }
    }
}

/// Free-setting order argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FreeOrderArg {
    /// Keep the order of the desired-state file
    #[value(name = "input")]
    Input,
    /// Immediate settings before pending-reboot settings
    #[value(name = "immediate-first")]
    ImmediateFirst,
}

impl From<FreeOrderArg> for FreeOrder {
    fn from(arg: FreeOrderArg) -> Self {
        match arg {
            FreeOrderArg::Input => Self::Input,
            FreeOrderArg::ImmediateFirst => Self::ImmediateFirst,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}
