//! Path helpers for user-supplied file locations.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the current user's home directory.
///
/// Paths without a leading `~`, or `~user` forms, are returned unchanged.
/// If the home directory cannot be determined the path is returned as is.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
