//! Concurrent refresh of repository indexes
//!
//! Every repository is fetched in its own future and its cache files are
//! written on the blocking pool. A failing repository is recorded in its
//! [`SyncReport`] and never cancels the others.

use futures::future::join_all;

use crate::cache::write_index;
use crate::config::RepositoryEntry;
use crate::error::{RepoError, Result};
use crate::fetcher::IndexFetcher;

/// Result of refreshing one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Index fetched and cached
    Success {
        /// Number of packages in the fetched index
        packages: usize,
    },
    /// Fetch or cache write failed
    Failure(String),
}

/// Per-repository refresh report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub repository_name: String,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Success { .. })
    }
}

/// Refreshes the cached index of every configured repository
pub struct IndexSynchronizer<F> {
    fetcher: F,
}

impl<F: IndexFetcher> IndexSynchronizer<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Refresh all `entries` concurrently.
    ///
    /// Returns once every repository has finished, with one report per entry
    /// in the order of `entries`. There are no retries.
    pub async fn sync_all(&self, entries: &[RepositoryEntry]) -> Vec<SyncReport> {
        let tasks = entries.iter().map(|entry| async move {
            let outcome = match self.sync_one(entry).await {
                Ok(packages) => {
                    tracing::info!(
                        repository = %entry.name,
                        packages,
                        "Successfully got an update from the \"{}\" chart repository",
                        entry.name
                    );
                    SyncOutcome::Success { packages }
                }
                Err(e) => {
                    tracing::warn!(
                        repository = %entry.name,
                        "Unable to get an update from the \"{}\" chart repository ({}): {}",
                        entry.name,
                        entry.url,
                        e
                    );
                    SyncOutcome::Failure(e.to_string())
                }
            };

            SyncReport {
                repository_name: entry.name.clone(),
                outcome,
            }
        });

        join_all(tasks).await
    }

    async fn sync_one(&self, entry: &RepositoryEntry) -> Result<usize> {
        let document = self.fetcher.fetch(entry).await?;
        let packages = document.entries.len();
        let path = self.fetcher.cache_path(&entry.name);
        let name = entry.name.clone();

        tokio::task::spawn_blocking(move || write_index(&path, &name, &document))
            .await
            .map_err(|e| RepoError::Io(std::io::Error::other(e)))??;
        Ok(packages)
    }
}
