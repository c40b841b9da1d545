//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::coupling::CouplingError;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration or desired-state file.
    #[error("Failed to read file '{}': {source}", path.display())]
    FileRead {
        /// Path to the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Refused to overwrite an existing file.
    #[error("Refusing to overwrite existing file '{}'", path.display())]
    FileExists {
        /// Path that already exists
        path: PathBuf,
    },

    /// Missing required field that must be provided by CLI or config file.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// Invalid URL provided.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The invalid URL string
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid duration value (zero or too large).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Chunk size must be positive.
    #[error("Invalid max_chunk_size {0}: must be greater than 0")]
    InvalidChunkSize(usize),

    /// A string option did not name one of the accepted choices.
    #[error("Invalid {field} '{value}': expected {expected}")]
    InvalidChoice {
        /// Name of the field
        field: &'static str,
        /// The rejected value
        value: String,
        /// Human-readable list of accepted values
        expected: &'static str,
    },

    /// Invalid retry configuration.
    #[error("Invalid retry configuration: {0}")]
    InvalidRetry(String),

    /// Invalid coupling group in the configuration file.
    #[error("Invalid coupling group in {scope}: {source}")]
    InvalidCoupling {
        /// `default` or the family the group belongs to
        scope: String,
        /// Underlying coupling error
        #[source]
        source: CouplingError,
    },

    /// Invalid desired-state file.
    #[error("Invalid desired-state file '{}': {reason}", path.display())]
    InvalidDesired {
        /// Path to the desired-state file
        path: PathBuf,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid header format.
    #[error("Invalid header format '{value}': expected 'Key=Value' or 'Key: Value'")]
    InvalidHeader {
        /// The invalid header string
        value: String,
    },

    /// Invalid header name.
    #[error("Invalid header name '{name}': {reason}")]
    InvalidHeaderName {
        /// The invalid header name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid header value.
    #[error("Invalid header value for '{name}': {reason}")]
    InvalidHeaderValue {
        /// The header name
        name: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Well-known field names for `MissingRequired` errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The control plane endpoint field.
    pub const ENDPOINT: &str = "endpoint";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
