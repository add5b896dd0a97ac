//! Repository configuration management
//!
//! Stores the ordered list of configured repositories in a
//! Helm-compatible `repositories.yaml`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cache::CachePurge;
use crate::error::{RepoError, Result};
use crate::fs::write_atomic;

/// Repository configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFile {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// When this file was last written
    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    /// Configured repositories, in the order they were added
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for RepositoryFile {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            generated: Utc::now(),
            repositories: Vec::new(),
        }
    }
}

/// Loads, edits and persists the repository configuration file
#[derive(Debug, Clone)]
pub struct RepositoryConfigStore {
    path: PathBuf,
    file: RepositoryFile,
}

impl RepositoryConfigStore {
    /// Load configuration from `path`; a missing file is an error.
    ///
    /// Every entry is validated as if it had been added, and a name may
    /// appear only once.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepoError::ConfigNotFound { path });
            }
            Err(e) => return Err(e.into()),
        };

        let file = if content.trim().is_empty() {
            RepositoryFile::default()
        } else {
            serde_yaml::from_str(&content)?
        };
        check_entries(&path, &file.repositories)?;

        Ok(Self { path, file })
    }

    /// Load configuration from `path`, starting empty if it does not exist yet
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self> {
        match Self::load(path) {
            Err(RepoError::ConfigNotFound { path }) => Ok(Self {
                path,
                file: RepositoryFile::default(),
            }),
            other => other,
        }
    }

    /// Persist the configuration (write-then-replace)
    pub fn save(&mut self) -> Result<()> {
        self.file.generated = Utc::now();
        let content = serde_yaml::to_string(&self.file)?;
        write_atomic(&self.path, content.as_bytes())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured repositories in file order
    pub fn entries(&self) -> &[RepositoryEntry] {
        &self.file.repositories
    }

    pub fn is_empty(&self) -> bool {
        self.file.repositories.is_empty()
    }

    /// Get a repository by name
    pub fn get(&self, name: &str) -> Option<&RepositoryEntry> {
        self.file.repositories.iter().find(|r| r.name == name)
    }

    /// List all repository names
    pub fn names(&self) -> Vec<&str> {
        self.file
            .repositories
            .iter()
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Add a repository (in memory, call [`save`](Self::save) to persist)
    pub fn add(&mut self, entry: RepositoryEntry) -> Result<()> {
        entry.validate()?;
        if self.get(&entry.name).is_some() {
            return Err(RepoError::RepositoryAlreadyExists { name: entry.name });
        }
        self.file.repositories.push(entry);
        Ok(())
    }

    /// Remove repositories by name.
    ///
    /// Names are processed in order. Each removal is persisted and the
    /// repository's cache files are purged before moving on; the first
    /// unknown name stops the loop with `RepositoryNotFound`, leaving the
    /// earlier removals in place.
    pub fn remove<S, C>(&mut self, names: &[S], cache: &C) -> Result<Vec<RepositoryEntry>>
    where
        S: AsRef<str>,
        C: CachePurge + ?Sized,
    {
        let mut removed = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            let idx = self
                .file
                .repositories
                .iter()
                .position(|r| r.name == name)
                .ok_or_else(|| RepoError::RepositoryNotFound {
                    name: name.to_string(),
                })?;

            let entry = self.file.repositories.remove(idx);
            self.save()?;
            cache.purge(name)?;

            tracing::info!(repository = name, "repository removed");
            removed.push(entry);
        }

        Ok(removed)
    }
}

fn check_entries(path: &Path, entries: &[RepositoryEntry]) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        entry.validate()?;
        if !seen.insert(entry.name.as_str()) {
            return Err(RepoError::InvalidConfig {
                message: format!(
                    "{}: repository \"{}\" is defined more than once",
                    path.display(),
                    entry.name
                ),
            });
        }
    }
    Ok(())
}

/// Repository definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryEntry {
    /// Unique name for this repository
    pub name: String,

    /// Repository URL (HTTP(S) or file)
    pub url: String,

    /// Credentials sent when fetching the index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<RepoAuth>,

    /// Skip TLS verification (insecure, not recommended)
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

impl RepositoryEntry {
    /// Create a validated repository entry
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let entry = Self {
            name: name.into(),
            url: url.into(),
            auth: None,
            insecure_skip_tls_verify: false,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Attach credentials
    pub fn with_auth(mut self, auth: RepoAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Check the name and URL.
    ///
    /// The name doubles as a cache file name, so path separators are rejected.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| RepoError::InvalidRepository {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(invalid("name must not contain path separators"));
        }

        let url = url::Url::parse(&self.url).map_err(|e| invalid(&e.to_string()))?;
        match url.scheme() {
            "http" | "https" | "file" => Ok(()),
            other => Err(invalid(&format!(
                "unsupported URL scheme '{}', expected http, https or file",
                other
            ))),
        }
    }

    /// URL of the repository's `index.yaml`
    pub fn index_url(&self) -> String {
        format!("{}/index.yaml", self.url.trim_end_matches('/'))
    }
}

/// Credentials for a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepoAuth {
    /// Basic authentication (username/password)
    Basic { username: String, password: String },

    /// Bearer token authentication
    Bearer { token: String },
}

impl RepoAuth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        RepoAuth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        RepoAuth::Bearer {
            token: token.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::IndexCache;
    use tempfile::TempDir;

    #[test]
    fn test_repository_entry_validation() {
        assert!(RepositoryEntry::new("bitnami", "https://charts.bitnami.com/bitnami").is_ok());
        assert!(RepositoryEntry::new("local", "file:///srv/charts").is_ok());

        assert!(RepositoryEntry::new("", "https://example.com").is_err());
        assert!(RepositoryEntry::new("a/b", "https://example.com").is_err());
        assert!(RepositoryEntry::new("..", "https://example.com").is_err());
        assert!(RepositoryEntry::new("test", "not a url").is_err());
        assert!(RepositoryEntry::new("test", "oci://ghcr.io/org/charts").is_err());
    }

    #[test]
    fn test_index_url() {
        let repo = RepositoryEntry::new("stable", "https://example.com/charts/").unwrap();
        assert_eq!(repo.index_url(), "https://example.com/charts/index.yaml");
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");

        let err = RepositoryConfigStore::load(&path).unwrap_err();
        assert!(matches!(err, RepoError::ConfigNotFound { .. }));

        let store = RepositoryConfigStore::load_or_default(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_rejects_invalid_entry() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");
        std::fs::write(
            &path,
            "repositories:\n  - name: ../escaped\n    url: https://example.com\n",
        )
        .unwrap();

        let err = RepositoryConfigStore::load(&path).unwrap_err();
        assert!(matches!(err, RepoError::InvalidRepository { name, .. } if name == "../escaped"));
        assert!(RepositoryConfigStore::load_or_default(&path).is_err());
    }

    #[test]
    fn test_load_rejects_duplicate_names() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");
        std::fs::write(
            &path,
            "repositories:\n  - name: dup\n    url: https://one.example.com\n  - name: dup\n    url: https://two.example.com\n",
        )
        .unwrap();

        let err = RepositoryConfigStore::load(&path).unwrap_err();
        assert!(matches!(&err, RepoError::InvalidConfig { message } if message.contains("\"dup\"")));
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let tmp = TempDir::new().unwrap();
        let mut store =
            RepositoryConfigStore::load_or_default(tmp.path().join("repositories.yaml")).unwrap();

        store
            .add(RepositoryEntry::new("test", "https://example.com").unwrap())
            .unwrap();
        let err = store
            .add(RepositoryEntry::new("test", "https://other.com").unwrap())
            .unwrap_err();
        assert!(matches!(err, RepoError::RepositoryAlreadyExists { name } if name == "test"));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn test_save_and_reload_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config").join("repositories.yaml");

        let mut store = RepositoryConfigStore::load_or_default(&path).unwrap();
        store
            .add(RepositoryEntry::new("zeta", "https://zeta.example.com").unwrap())
            .unwrap();
        store
            .add(
                RepositoryEntry::new("alpha", "https://alpha.example.com")
                    .unwrap()
                    .with_auth(RepoAuth::basic("user", "pass")),
            )
            .unwrap();
        store.save().unwrap();

        let reloaded = RepositoryConfigStore::load(&path).unwrap();
        assert_eq!(reloaded.names(), vec!["zeta", "alpha"]);
        assert_eq!(
            reloaded.get("alpha").unwrap().auth,
            Some(RepoAuth::basic("user", "pass"))
        );
    }

    #[test]
    fn test_remove_purges_cache_and_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");
        let cache = IndexCache::new(tmp.path().join("cache"));

        let mut store = RepositoryConfigStore::load_or_default(&path).unwrap();
        store
            .add(RepositoryEntry::new("stable", "https://stable.example.com").unwrap())
            .unwrap();
        store
            .add(RepositoryEntry::new("incubator", "https://incubator.example.com").unwrap())
            .unwrap();
        store.save().unwrap();

        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.index_path("stable"), "entries: {}").unwrap();
        std::fs::write(cache.charts_path("stable"), "nginx\n").unwrap();

        let removed = store.remove(&["stable"], &cache).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!cache.index_path("stable").exists());
        assert!(!cache.charts_path("stable").exists());

        let reloaded = RepositoryConfigStore::load(&path).unwrap();
        assert_eq!(reloaded.names(), vec!["incubator"]);
    }

    #[test]
    fn test_remove_fails_fast_on_unknown_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");
        let cache = IndexCache::new(tmp.path().join("cache"));

        let mut store = RepositoryConfigStore::load_or_default(&path).unwrap();
        for name in ["one", "two", "three"] {
            store
                .add(RepositoryEntry::new(name, "https://example.com").unwrap())
                .unwrap();
        }
        store.save().unwrap();

        let err = store.remove(&["one", "missing", "three"], &cache).unwrap_err();
        assert!(matches!(err, RepoError::RepositoryNotFound { name } if name == "missing"));

        // "one" was removed and persisted before the failure, "three" was not touched
        let reloaded = RepositoryConfigStore::load(&path).unwrap();
        assert_eq!(reloaded.names(), vec!["two", "three"]);
    }

    #[test]
    fn test_config_serialization() {
        let mut file = RepositoryFile::default();
        file.repositories
            .push(RepositoryEntry::new("bitnami", "https://charts.bitnami.com/bitnami").unwrap());

        let yaml = serde_yaml::to_string(&file).unwrap();
        assert!(yaml.contains("bitnami"));
        assert!(!yaml.contains("auth"));

        let parsed: RepositoryFile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.repositories.len(), 1);
    }
}
