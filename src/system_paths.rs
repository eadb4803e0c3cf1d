use std::path::{Path, PathBuf};

/// Centralized helpers for files rooted at the data root.
/// Keeps locations consistent between the stores and the startup log.
#[inline]
pub fn users_path(data_root: &Path) -> PathBuf { data_root.join("users.json") }

#[inline]
pub fn contacts_path(data_root: &Path) -> PathBuf { data_root.join("contacts.json") }

#[inline]
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
