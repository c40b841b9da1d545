//! Coupled groups and the per-family table.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::setting::SettingName;

/// Error constructing a coupling group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouplingError {
    /// A group must name at least two distinct settings.
    #[error("Coupled group needs at least two distinct members, got {members:?}")]
    TooFewMembers {
        /// The members that were provided
        members: Vec<String>,
    },
}

/// A set of setting names that must be submitted in the same call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoupledGroup {
    members: BTreeSet<SettingName>,
}

impl CoupledGroup {
    /// Creates a group from two or more distinct names.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::TooFewMembers`] if fewer than two distinct
    /// names (case-insensitive) are given.
    pub fn new<I, N>(members: I) -> Result<Self, CouplingError>
    where
        I: IntoIterator<Item = N>,
        N: Into<SettingName>,
    {
        let members: BTreeSet<SettingName> = members.into_iter().map(Into::into).collect();
        if members.len() < 2 {
            return Err(CouplingError::TooFewMembers {
                members: members.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(Self { members })
    }

    /// Returns true if `name` is a member.
    #[must_use]
    pub fn contains(&self, name: &SettingName) -> bool {
        self.members.contains(name)
    }

    /// Iterates members in ascending (case-insensitive) order.
    pub fn members(&self) -> impl Iterator<Item = &SettingName> {
        self.members.iter()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; groups have at least two members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.members.iter().any(|m| other.members.contains(m))
    }

    fn absorb(&mut self, other: Self) {
        self.members.extend(other.members);
    }
}

/// Resolved coupling rules for one engine family.
///
/// Overlapping groups are merged on construction, so every name belongs to
/// at most one group and group identity is a plain index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouplingRules {
    groups: Vec<CoupledGroup>,
}

impl CouplingRules {
    /// Builds rules from groups, merging any that share a member.
    #[must_use]
    pub fn new(groups: impl IntoIterator<Item = CoupledGroup>) -> Self {
        let mut merged: Vec<CoupledGroup> = Vec::new();
        for mut group in groups {
            // Pull every existing group that overlaps into the new one
            let mut i = 0;
            while i < merged.len() {
                if merged[i].overlaps(&group) {
                    group.absorb(merged.remove(i));
                } else {
                    i += 1;
                }
            }
            merged.push(group);
        }
        Self { groups: merged }
    }

    /// Rules with no coupling at all.
    #[must_use]
    pub const fn none() -> Self {
        Self { groups: Vec::new() }
    }

    /// Returns the index of the group containing `name`, if any.
    #[must_use]
    pub fn group_of(&self, name: &SettingName) -> Option<usize> {
        self.groups.iter().position(|g| g.contains(name))
    }

    /// Returns the resolved groups.
    #[must_use]
    pub fn groups(&self) -> &[CoupledGroup] {
        &self.groups
    }

    /// Returns true if no groups are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Coupling groups keyed by engine family.
///
/// Groups in [`CouplingTable::common`] apply to every family; groups added
/// with [`CouplingTable::with_family_group`] apply only to that family
/// (matched case-insensitively). Loaded once at startup and passed to the
/// planner, never consulted through global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouplingTable {
    common: Vec<CoupledGroup>,
    families: HashMap<String, Vec<CoupledGroup>>,
}

impl CouplingTable {
    /// Creates an empty table (no coupling for any family).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            common: Vec::new(),
            families: HashMap::new(),
        }
    }

    /// Built-in rules known to be enforced by relational engine APIs:
    ///
    /// - `character_set_server` with `collation_server`
    /// - `ssl_max_protocol_version` with `ssl_min_protocol_version`
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_common_group(Self::pair("character_set_server", "collation_server"))
            .with_common_group(Self::pair(
                "ssl_max_protocol_version",
                "ssl_min_protocol_version",
            ))
    }

    fn pair(a: &str, b: &str) -> CoupledGroup {
        CoupledGroup {
            members: [SettingName::new(a), SettingName::new(b)].into(),
        }
    }

    /// Adds a group that applies to every family.
    #[must_use]
    pub fn with_common_group(mut self, group: CoupledGroup) -> Self {
        self.common.push(group);
        self
    }

    /// Adds a group that applies only to `family`.
    #[must_use]
    pub fn with_family_group(mut self, family: &str, group: CoupledGroup) -> Self {
        self.families
            .entry(family.to_ascii_lowercase())
            .or_default()
            .push(group);
        self
    }

    /// Groups applying to every family.
    #[must_use]
    pub fn common(&self) -> &[CoupledGroup] {
        &self.common
    }

    /// Resolves the effective rules for `family`.
    #[must_use]
    pub fn rules_for(&self, family: &str) -> CouplingRules {
        let specific = self
            .families
            .get(&family.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default();

        CouplingRules::new(self.common.iter().chain(specific).cloned())
    }

    /// Returns the number of families with specific groups.
    #[must_use]
    pub fn family_count(&self) -> usize {
        self.families.len()
    }
}

impl Default for CouplingTable {
    fn default() -> Self {
        Self::builtin()
    }
}
