//! Drift between desired and observed settings.

use std::collections::HashMap;

use crate::setting::{Setting, SettingName, SettingSource, find_duplicate};

use super::ReconcileError;

/// Changes needed to bring observed settings to the desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    /// Desired settings that are missing or differ, in desired order.
    pub to_set: Vec<Setting>,
    /// Observed user settings absent from desired, ascending by name,
    /// as observed.
    pub to_reset: Vec<Setting>,
}

impl Drift {
    /// Returns true when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_set.is_empty() && self.to_reset.is_empty()
    }
}

/// Computes drift from `observed` to `desired`.
///
/// Names match case-insensitively, so a spelling-only difference is not
/// drift. A desired setting drifts when observed lacks it or its value or
/// apply timing differs. Observed settings absent from desired are reset
/// only when user-sourced; system and engine-default values are left alone.
///
/// # Errors
///
/// Returns [`ReconcileError::DuplicateSetting`] if `desired` names a
/// setting twice.
///
/// # Example
///
/// ```
/// use paramsync::reconcile::diff;
/// use paramsync::setting::Setting;
///
/// let desired = vec![Setting::new("max_connections", "500")];
/// let observed = vec![
///     Setting::new("MAX_CONNECTIONS", "500"),
///     Setting::new("wait_timeout", "60"),
/// ];
///
/// let drift = diff(&desired, &observed).unwrap();
/// assert!(drift.to_set.is_empty());
/// assert_eq!(drift.to_reset[0].name.as_str(), "wait_timeout");
/// ```
pub fn diff(desired: &[Setting], observed: &[Setting]) -> Result<Drift, ReconcileError> {
    if let Some(name) = find_duplicate(desired) {
        return Err(ReconcileError::DuplicateSetting { name: name.clone() });
    }

    let observed_by_name: HashMap<&SettingName, &Setting> =
        observed.iter().map(|s| (&s.name, s)).collect();

    let to_set: Vec<Setting> = desired
        .iter()
        .filter(|want| {
            observed_by_name
                .get(&want.name)
                .is_none_or(|have| !want.same_effect(have))
        })
        .cloned()
        .collect();

    let mut to_reset: Vec<Setting> = observed
        .iter()
        .filter(|have| have.source == SettingSource::User)
        .filter(|have| !desired.iter().any(|want| want.name == have.name))
        .cloned()
        .collect();
    to_reset.sort_by(|a, b| a.name.cmp(&b.name));
    to_reset.dedup_by(|a, b| a.name == b.name);

    Ok(Drift { to_set, to_reset })
}
