//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Control plane connection section
    #[serde(default)]
    pub remote: RemoteSection,

    /// Chunk planner section
    #[serde(default)]
    pub planner: PlannerSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Coupling knowledge base overrides
    #[serde(default)]
    pub coupling: CouplingSection,
}

/// Control plane connection section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    /// Control plane base URL
    pub endpoint: Option<String>,

    /// Bearer token for Authorization header
    pub bearer: Option<String>,

    /// HTTP headers as key-value pairs
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Per-call timeout in seconds
    pub timeout: Option<u64>,
}

/// Chunk planner section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerSection {
    /// Maximum number of settings per remote call
    pub max_chunk_size: Option<usize>,

    /// "isolated" or "fill"
    pub coupled_packing: Option<String>,

    /// "input" or "immediate-first"
    pub free_order: Option<String>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of attempts per call
    pub max_attempts: Option<u32>,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,

    /// Jitter fraction in `[0.0, 1.0]`
    pub jitter: Option<f64>,
}

/// Coupling knowledge base section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouplingSection {
    /// Groups applied to every family. Replaces the built-in groups when set.
    pub groups: Option<Vec<Vec<String>>>,

    /// Additional groups keyed by engine family
    #[serde(default)]
    pub families: BTreeMap<String, Vec<Vec<String>>>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# paramsync configuration file

[remote]
# Control plane base URL (required for plan, apply and destroy)
# endpoint = "https://control.example.com/v1"

# Bearer token for Authorization header
# bearer = "your-token-here"

# Extra HTTP headers
# [remote.headers]
# X-Request-Source = "paramsync"

# Per-call timeout in seconds (default: 30)
# timeout = 30

[planner]
# Maximum number of settings per remote call (default: 20)
max_chunk_size = 20

# How coupled groups share chunks: "isolated" (default) or "fill"
# coupled_packing = "isolated"

# Order of uncoupled settings: "input" (default) or "immediate-first"
# free_order = "input"

[retry]
# Maximum number of attempts per call (default: 5)
# max_attempts = 5

# Initial retry delay in milliseconds (default: 1000)
# initial_delay_ms = 1000

# Maximum retry delay in milliseconds (default: 30000)
# max_delay_ms = 30000

# Backoff multiplier (default: 2.0)
# multiplier = 2.0

# Jitter fraction between 0.0 and 1.0 (default: 0.2)
# jitter = 0.2

[coupling]
# Groups that must always be submitted together, for every family.
# Setting this replaces the built-in groups.
# groups = [
#     ["character_set_server", "collation_server"],
#     ["ssl_min_protocol_version", "ssl_max_protocol_version"],
# ]

# Additional groups for one engine family (case-insensitive)
# [coupling.families]
# postgres16 = [["max_wal_size", "min_wal_size"]]
"#
    .to_string()
}
