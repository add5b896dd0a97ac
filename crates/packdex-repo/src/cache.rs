//! On-disk cache of repository indexes
//!
//! One `<name>-index.yaml` per repository, plus a `<name>-charts.txt`
//! listing the package names it contains. Files are namespaced by
//! repository name, so concurrent writers for different repositories
//! never touch the same path.

use std::path::{Path, PathBuf};

use crate::error::{RepoError, Result};
use crate::fs::{remove_if_exists, write_atomic};
use crate::index::IndexDocument;

/// Read access to cached indexes, keyed by repository name
pub trait CacheReader {
    /// Load the cached index of repository `name`
    fn load_index(&self, name: &str) -> Result<IndexDocument>;
}

/// Removal of cached indexes, keyed by repository name
pub trait CachePurge {
    /// Delete every cache artifact of repository `name`; absent files are fine
    fn purge(&self, name: &str) -> Result<()>;
}

/// Directory-backed index cache
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    /// Use `dir` as the cache root (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get default cache directory
    pub fn default_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine cache directory".to_string(),
        })?;
        Ok(cache_dir.join("packdex").join("repository"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cached index for repository `name`
    pub fn index_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}-index.yaml", name))
    }

    /// Path of the package-name list for repository `name`
    pub fn charts_path(&self, name: &str) -> PathBuf {
        charts_path_beside(&self.index_path(name), name)
    }

    /// Store an index for repository `name`
    pub fn store(&self, name: &str, index: &IndexDocument) -> Result<()> {
        write_index(&self.index_path(name), name, index)
    }

}

impl CacheReader for IndexCache {
    fn load_index(&self, name: &str) -> Result<IndexDocument> {
        load_index_at(&self.index_path(name))
    }
}

impl CachePurge for IndexCache {
    fn purge(&self, name: &str) -> Result<()> {
        purge_index(&self.index_path(name), name)
    }
}

/// Package-name list that lives next to an index file
pub fn charts_path_beside(index_path: &Path, name: &str) -> PathBuf {
    index_path.with_file_name(format!("{}-charts.txt", name))
}

/// Read and parse the index stored at `index_path`
pub fn load_index_at(index_path: &Path) -> Result<IndexDocument> {
    let bytes = std::fs::read(index_path)?;
    IndexDocument::from_bytes(&bytes)
}

/// Delete the index at `index_path` and the package-name list beside it
pub(crate) fn purge_index(index_path: &Path, name: &str) -> Result<()> {
    remove_if_exists(&charts_path_beside(index_path, name))?;
    if remove_if_exists(index_path)? {
        tracing::debug!(repository = name, "purged cached index");
    }
    Ok(())
}

/// Atomically write `index` to `index_path`, then its package-name list
pub(crate) fn write_index(index_path: &Path, name: &str, index: &IndexDocument) -> Result<()> {
    let yaml = index.to_yaml()?;
    write_atomic(index_path, yaml.as_bytes())?;

    let mut names = index.names().join("\n");
    names.push('\n');
    write_atomic(&charts_path_beside(index_path, name), names.as_bytes())
}
