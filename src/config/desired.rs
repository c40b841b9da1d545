//! Desired-state file parsing.
//!
//! A desired-state file names one parameter set and lists the settings it
//! should carry:
//!
//! ```toml
//! name = "app-mysql"
//! family = "mysql8.0"
//! retain_on_destroy = false
//!
//! [[parameter]]
//! name = "character_set_server"
//! value = "utf8mb4"
//! apply_method = "immediate"
//! ```
//!
//! Values may be strings, integers or booleans. Non-integer numbers must be
//! quoted (`value = "0.5"`) so their spelling reaches the remote unchanged.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::setting::{ApplyTiming, ParameterSet, Setting, SettingName};

use super::ConfigError;
use super::paths::expand_tilde;

/// Desired state loaded from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desired {
    /// The parameter set the remote side should end up with.
    pub parameter_set: ParameterSet,
    /// Keep the remote parameter set when destroying.
    pub retain_on_destroy: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DesiredFile {
    name: String,
    family: String,
    description: Option<String>,
    #[serde(default)]
    retain_on_destroy: bool,
    #[serde(default, rename = "parameter")]
    parameters: Vec<DesiredParameter>,
}

/// One `[[parameter]]` entry. Provenance is not accepted from the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DesiredParameter {
    name: SettingName,
    value: ParameterValue,
    #[serde(default)]
    apply_method: ApplyTiming,
}

#[derive(Debug, Deserialize)]
#[serde(
    untagged,
    expecting = "a string, integer or boolean value (quote non-integer numbers)"
)]
enum ParameterValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl From<DesiredParameter> for Setting {
    fn from(parameter: DesiredParameter) -> Self {
        let value = match parameter.value {
            ParameterValue::Text(s) => s,
            ParameterValue::Integer(i) => i.to_string(),
            ParameterValue::Bool(b) => b.to_string(),
        };
        Self::new(parameter.name, value).with_apply_timing(parameter.apply_method)
    }
}

impl Desired {
    /// Loads a desired-state file. A leading `~` in `path` is expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// leaves `name` or `family` blank.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = expand_tilde(path);
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        Self::parse(&content, &path)
    }

    /// Parses a desired-state document; `path` is only used in errors.
    ///
    /// Duplicate setting names are kept as written and rejected later by
    /// reconciliation.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or `name`/`family` is blank.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: DesiredFile = toml::from_str(content)?;

        let name = file.name.trim();
        if name.is_empty() {
            return Err(invalid(path, "name must not be empty"));
        }

        let family = file.family.trim();
        if family.is_empty() {
            return Err(invalid(path, "family must not be empty"));
        }

        let mut parameter_set = ParameterSet::new(name, family)
            .with_settings(file.parameters.into_iter().map(Setting::from));
        if let Some(description) = file.description {
            parameter_set = parameter_set.with_description(description);
        }

        Ok(Self {
            parameter_set,
            retain_on_destroy: file.retain_on_destroy,
        })
    }
}

fn invalid(path: &Path, reason: &str) -> ConfigError {
    ConfigError::InvalidDesired {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}
