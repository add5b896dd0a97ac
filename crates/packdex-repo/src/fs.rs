//! Filesystem helpers shared by the config store and the index cache

use std::io::Write;
use std::path::Path;

use crate::error::{RepoError, Result};

/// Write `contents` to `path` through a temporary sibling file and a rename,
/// so readers never observe a truncated file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_failed = |source| RepoError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_failed)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(contents).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    Ok(())
}

/// Remove a file, treating "already gone" as success
pub(crate) fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("file.yaml");

        write_atomic(&path, b"hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file.yaml");

        write_atomic(&path, b"first version, rather long").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        // No temp files left behind
        let leftovers = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_remove_if_exists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone.txt");

        assert!(!remove_if_exists(&path).unwrap());
        std::fs::write(&path, "x").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }
}
