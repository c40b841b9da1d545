//! Case-insensitive setting identifier.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// The name of a setting.
///
/// Remote control planes treat setting names case-insensitively
/// (`Max_connections` and `max_connections` address the same setting),
/// but echo back whatever spelling was last submitted. This type keeps the
/// caller's spelling for submission and display while comparing, hashing
/// and ordering on the ASCII-lowercased form.
///
/// # Example
///
/// ```
/// use paramsync::setting::SettingName;
///
/// let a = SettingName::new("Max_connections");
/// let b = SettingName::new("max_connections");
///
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "Max_connections");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingName(String);

impl SettingName {
    /// Creates a setting name, keeping the given spelling.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as originally spelled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the normalized (lowercased) form used for identity.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Returns true if `other` names the same setting, ignoring ASCII case.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for SettingName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for SettingName {}

impl Hash for SettingName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.folded() {
            state.write_u8(b);
        }
        // Terminator keeps ("ab", "c") and ("a", "bc") apart in tuple hashes
        state.write_u8(0xff);
    }
}

impl PartialOrd for SettingName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SettingName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SettingName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SettingName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for SettingName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
