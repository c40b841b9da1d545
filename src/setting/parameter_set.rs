//! Named collection of settings attached to one managed resource.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Setting, SettingName};

/// Description given to parameter sets created without one.
pub const DEFAULT_DESCRIPTION: &str = "Managed by paramsync";

/// A named, ordered collection of [`Setting`]s.
///
/// The declared order of `settings` is significant: the reconciler emits
/// drift in this order and the planner preserves it for free settings.
///
/// Name uniqueness is not enforced on construction so that both desired
/// input and remote observations can be represented as given; consumers
/// check it with [`find_duplicate`] and reject duplicates themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Identifier of the parameter set on the remote side.
    pub name: String,
    /// Engine family (e.g. `mysql8.0`), selects coupling rules.
    pub family: String,
    /// Free-text description.
    #[serde(default = "default_description")]
    pub description: String,
    /// Settings in declared order.
    #[serde(default)]
    pub settings: Vec<Setting>,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new(name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            description: default_description(),
            settings: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a setting.
    #[must_use]
    pub fn with_setting(mut self, setting: Setting) -> Self {
        self.settings.push(setting);
        self
    }

    /// Appends several settings, keeping their order.
    #[must_use]
    pub fn with_settings(mut self, settings: impl IntoIterator<Item = Setting>) -> Self {
        self.settings.extend(settings);
        self
    }

    /// Looks up a setting by name, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.name.matches(name))
    }

    /// Returns true if a setting with this name exists.
    #[must_use]
    pub fn contains(&self, name: &SettingName) -> bool {
        self.settings.iter().any(|s| &s.name == name)
    }

    /// Returns the number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Returns true if there are no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Iterates settings in declared order.
    pub fn iter(&self) -> std::slice::Iter<'_, Setting> {
        self.settings.iter()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Setting;
    type IntoIter = std::slice::Iter<'a, Setting>;

    fn into_iter(self) -> Self::IntoIter {
        self.settings.iter()
    }
}

/// Returns the first name that occurs more than once (ignoring case).
#[must_use]
pub fn find_duplicate(settings: &[Setting]) -> Option<&SettingName> {
    let mut seen = HashSet::with_capacity(settings.len());
    settings
        .iter()
        .map(|s| &s.name)
        .find(|name| !seen.insert(*name))
}
