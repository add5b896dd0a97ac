//! In-memory search index over every cached repository index
//!
//! Built once per search session from the cache and never mutated
//! afterwards. Building is best effort: a repository whose cache is missing
//! or corrupt is skipped with a warning and contributes no rows.

use serde::Serialize;

use crate::cache::CacheReader;
use crate::config::RepositoryEntry;
use crate::index::{IndexDocument, VersionEntry};

/// One (package, repository, version) triple
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRow {
    pub package_name: String,
    pub repository_name: String,
    pub version_entry: VersionEntry,
}

/// What happened to a repository while building the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cached index was loaded and contributed `rows` rows
    Loaded { rows: usize },
    /// The cached index could not be used
    Skipped { reason: String },
}

/// Aggregated rows of all successfully loaded repositories
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    rows: Vec<IndexRow>,
    outcomes: Vec<(String, LoadOutcome)>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from the cached documents of `entries`, in order.
    ///
    /// Only configured repositories are read, so stray cache files are ignored.
    pub fn build<R>(entries: &[RepositoryEntry], cache: &R) -> Self
    where
        R: CacheReader + ?Sized,
    {
        let mut index = Self::new();

        for entry in entries {
            let name = entry.name.as_str();
            match cache.load_index(name) {
                Ok(document) => {
                    let rows = index.add_repository(name, document);
                    tracing::debug!(repository = name, rows, "loaded cached index");
                    index
                        .outcomes
                        .push((name.to_string(), LoadOutcome::Loaded { rows }));
                }
                Err(e) => {
                    tracing::warn!(
                        repository = name,
                        "Repo \"{}\" is corrupt or missing. Try 'packdex repo update': {}",
                        name,
                        e
                    );
                    index.outcomes.push((
                        name.to_string(),
                        LoadOutcome::Skipped {
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }

        index
    }

    /// Append every version of every package in `document`, tagged with
    /// `repository`. Versions are appended newest first. Returns the number
    /// of rows added.
    pub fn add_repository(&mut self, repository: &str, mut document: IndexDocument) -> usize {
        document.sort_entries();
        let before = self.rows.len();

        for (package, versions) in document.entries {
            for version_entry in versions {
                self.rows.push(IndexRow {
                    package_name: package.clone(),
                    repository_name: repository.to_string(),
                    version_entry,
                });
            }
        }

        self.rows.len() - before
    }

    /// Every row, in insertion order
    pub fn all_entries(&self) -> &[IndexRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-repository load outcomes, in configuration order
    pub fn load_outcomes(&self) -> &[(String, LoadOutcome)] {
        &self.outcomes
    }

    /// Repositories that were skipped, with the reason
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            LoadOutcome::Skipped { reason } => Some((name.as_str(), reason.as_str())),
            LoadOutcome::Loaded { .. } => None,
        })
    }
}
