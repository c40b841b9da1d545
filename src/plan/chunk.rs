//! A group of settings submitted in one remote call.

use crate::setting::{Setting, SettingName};

/// An ordered group of settings submitted together.
///
/// Normally `len() <= max_chunk_size`. The single exception is a coupled
/// group with more members than the bound: it is kept whole and the chunk
/// is flagged oversized so the submitter can warn about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    settings: Vec<Setting>,
    oversized: bool,
}

impl Chunk {
    /// Creates a chunk from settings in submission order.
    #[must_use]
    pub const fn new(settings: Vec<Setting>) -> Self {
        Self {
            settings,
            oversized: false,
        }
    }

    pub(crate) const fn oversized(settings: Vec<Setting>) -> Self {
        Self {
            settings,
            oversized: true,
        }
    }

    /// Returns true if this chunk exceeds the configured size bound.
    #[must_use]
    pub const fn is_oversized(&self) -> bool {
        self.oversized
    }

    /// Returns the settings in submission order.
    #[must_use]
    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    /// Consumes the chunk, returning its settings.
    #[must_use]
    pub fn into_settings(self) -> Vec<Setting> {
        self.settings
    }

    /// Returns the number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Returns true if the chunk holds no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Iterates setting names in submission order.
    pub fn names(&self) -> impl Iterator<Item = &SettingName> {
        self.settings.iter().map(|s| &s.name)
    }

    /// Iterates settings that only take effect after a restart.
    pub fn pending_reboot(&self) -> impl Iterator<Item = &Setting> {
        self.settings.iter().filter(|s| s.requires_restart())
    }
}

impl<'a> IntoIterator for &'a Chunk {
    type Item = &'a Setting;
    type IntoIter = std::slice::Iter<'a, Setting>;

    fn into_iter(self) -> Self::IntoIter {
        self.settings.iter()
    }
}
