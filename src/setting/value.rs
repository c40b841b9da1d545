//! Settings and their apply semantics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::SettingName;

/// When the remote system makes a changed setting effective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyTiming {
    /// Applied live, without restarting the managed resource.
    #[default]
    Immediate,
    /// Applied only after the managed resource is restarted.
    PendingReboot,
}

impl ApplyTiming {
    /// Returns the wire spelling (`immediate` or `pending-reboot`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::PendingReboot => "pending-reboot",
        }
    }
}

impl fmt::Display for ApplyTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplyTiming {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "pending-reboot" | "pending_reboot" => Ok(Self::PendingReboot),
            _ => Err(ParseEnumError::new("apply timing", s)),
        }
    }
}

/// Where an observed setting value came from.
///
/// Only [`SettingSource::User`] values are owned by reconciliation; the
/// others are managed by the remote system and are never reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingSource {
    /// Explicitly set by a user (or by a previous reconciliation pass).
    #[default]
    User,
    /// Managed by the remote system.
    System,
    /// The engine's built-in default.
    EngineDefault,
}

impl SettingSource {
    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
            Self::EngineDefault => "engine-default",
        }
    }
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            "engine-default" | "engine_default" => Ok(Self::EngineDefault),
            _ => Err(ParseEnumError::new("setting source", s)),
        }
    }
}

/// Error returned when parsing [`ApplyTiming`] or [`SettingSource`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} '{value}'")]
pub struct ParseEnumError {
    /// Which enum was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A single named configuration value.
///
/// # Equality
///
/// Two settings are equal when names match case-insensitively and value,
/// apply timing and source are identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting identifier (case-insensitive).
    pub name: SettingName,
    /// Opaque value; numeric and boolean remote values are carried as text.
    #[serde(deserialize_with = "deserialize_value")]
    pub value: String,
    /// When the remote system applies a change to this setting.
    #[serde(rename = "apply_method", default)]
    pub apply_timing: ApplyTiming,
    /// Provenance of the value.
    #[serde(default)]
    pub source: SettingSource,
}

impl Setting {
    /// Creates a user-sourced setting applied immediately.
    #[must_use]
    pub fn new(name: impl Into<SettingName>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            apply_timing: ApplyTiming::Immediate,
            source: SettingSource::User,
        }
    }

    /// Creates a user-sourced setting applied immediately.
    #[must_use]
    pub fn immediate(name: impl Into<SettingName>, value: impl Into<String>) -> Self {
        Self::new(name, value)
    }

    /// Creates a user-sourced setting applied after a restart.
    #[must_use]
    pub fn pending_reboot(name: impl Into<SettingName>, value: impl Into<String>) -> Self {
        Self::new(name, value).with_apply_timing(ApplyTiming::PendingReboot)
    }

    /// Sets the apply timing.
    #[must_use]
    pub const fn with_apply_timing(mut self, timing: ApplyTiming) -> Self {
        self.apply_timing = timing;
        self
    }

    /// Sets the provenance.
    #[must_use]
    pub const fn with_source(mut self, source: SettingSource) -> Self {
        self.source = source;
        self
    }

    /// Returns true if the change only takes effect after a restart.
    #[must_use]
    pub const fn requires_restart(&self) -> bool {
        matches!(self.apply_timing, ApplyTiming::PendingReboot)
    }

    /// Returns true if value and apply timing match `other`.
    ///
    /// Name spelling and source are ignored; this is the drift predicate.
    #[must_use]
    pub fn same_effect(&self, other: &Self) -> bool {
        self.value == other.value && self.apply_timing == other.apply_timing
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.name, self.value, self.apply_timing)
    }
}

/// Scalar forms accepted for a setting value on the wire.
///
/// Numbers and booleans are carried as their textual form. Floats are
/// rendered in shortest form, so `90.0` arrives as `"90"`; desired-state
/// files reject unquoted floats for that reason.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

fn deserialize_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawValue::deserialize(deserializer)? {
        RawValue::Text(s) => s,
        RawValue::Integer(i) => i.to_string(),
        RawValue::Float(f) => f.to_string(),
        RawValue::Bool(b) => b.to_string(),
    })
}
