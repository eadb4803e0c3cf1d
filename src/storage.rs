//!
//! contactmgr storage helpers
//! --------------------------
//! Both stores keep their working set in memory and persist a JSON snapshot
//! of it under the data root after every mutation. Snapshots are written to a
//! sibling `.tmp` file first and renamed into place, so a crash mid-write
//! leaves the previous snapshot intact.

use std::fs;
use std::path::Path;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;
use crate::system_paths::tmp_path_for;

/// Load a snapshot, returning `None` when the file does not exist yet.
pub fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::Persist { path: path.display().to_string(), source: e }),
    };
    let value = serde_json::from_slice(&bytes)?;
    debug!(target: "contactmgr::storage", "read_snapshot: path='{}' bytes={}", path.display(), bytes.len());
    Ok(Some(value))
}

/// Atomically replace the snapshot at `path` with `value`.
pub fn write_snapshot<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let persist_err = |source: std::io::Error| StoreError::Persist { path: path.display().to_string(), source };
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(persist_err)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = tmp_path_for(path);
    fs::write(&tmp, &bytes).map_err(persist_err)?;
    fs::rename(&tmp, path).map_err(persist_err)?;
    debug!(target: "contactmgr::storage", "write_snapshot: path='{}' bytes={}", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_snapshot_reads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        let got: Option<Vec<u32>> = read_snapshot(&tmp.path().join("absent.json")).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn write_then_read_snapshot_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("snap.json");
        write_snapshot(&path, &vec![1u32, 2, 3]).unwrap();
        assert!(!tmp_path_for(&path).exists());
        let got: Option<Vec<u32>> = read_snapshot(&path).unwrap();
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[test]
    fn corrupt_snapshot_is_an_encode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, b"{not json").unwrap();
        let got: Result<Option<Vec<u32>>, _> = read_snapshot(&path);
        assert!(matches!(got, Err(StoreError::Encode(_))));
    }
}
