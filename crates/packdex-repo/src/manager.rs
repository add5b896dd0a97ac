//! High-level repository operations
//!
//! [`RepoManager`] ties the config store, cache, synchronizer and search
//! pipeline together behind the operations a front end exposes.

use std::path::PathBuf;

use crate::cache::{CachePurge, CacheReader, IndexCache, load_index_at, purge_index};
use crate::config::{RepositoryConfigStore, RepositoryEntry};
use crate::constraint::{ConstraintResolver, effective_constraint};
use crate::error::{RepoError, Result};
use crate::fetcher::{HttpFetcher, IndexFetcher};
use crate::index::IndexDocument;
use crate::query::{self, DEFAULT_MAX_SCORE, ScoredResult};
use crate::search::SearchIndex;
use crate::settings::Settings;
use crate::sync::{IndexSynchronizer, SyncReport};

/// Parameters of a package search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Keyword or regular expression; empty lists everything
    pub keyword: String,
    /// Explicit version constraint, overriding the stable/devel default
    pub constraint: Option<String>,
    /// Include pre-release versions when no constraint is given
    pub include_prerelease: bool,
    /// Keep every matching version instead of one per package
    pub keep_all_versions: bool,
    /// Treat `keyword` as a regular expression
    pub regex: bool,
    /// Drop literal matches scoring above this
    pub max_score: u32,
}

impl SearchOptions {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            constraint: None,
            include_prerelease: false,
            keep_all_versions: false,
            regex: false,
            max_score: DEFAULT_MAX_SCORE,
        }
    }
}

/// Repository operations over explicit [`Settings`].
///
/// The fetcher decides where each repository's index is cached; search and
/// remove read and purge through the same [`IndexFetcher::cache_path`] that
/// sync writes to.
pub struct RepoManager<F = HttpFetcher> {
    settings: Settings,
    synchronizer: IndexSynchronizer<F>,
}

impl RepoManager<HttpFetcher> {
    /// Manager fetching over HTTP with the configured timeout
    pub fn new(settings: Settings) -> Result<Self> {
        let cache = IndexCache::new(&settings.repository_cache);
        let fetcher = HttpFetcher::with_timeout(cache, settings.timeout)?;
        Ok(Self::with_fetcher(settings, fetcher))
    }
}

impl<F: IndexFetcher> RepoManager<F> {
    /// Manager using a custom fetcher
    pub fn with_fetcher(settings: Settings, fetcher: F) -> Self {
        Self {
            settings,
            synchronizer: IndexSynchronizer::new(fetcher),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Where the index of repository `name` is cached
    pub fn index_path(&self, name: &str) -> PathBuf {
        self.synchronizer.fetcher().cache_path(name)
    }

    fn fetcher_cache(&self) -> FetcherCache<'_, F> {
        FetcherCache(self.synchronizer.fetcher())
    }

    /// Configured repositories; empty when no config file exists yet
    pub fn list_repositories(&self) -> Result<Vec<RepositoryEntry>> {
        let store = RepositoryConfigStore::load_or_default(&self.settings.repository_config)?;
        Ok(store.entries().to_vec())
    }

    /// Add a repository and persist the config, creating it if needed
    pub fn add_repository(&self, entry: RepositoryEntry) -> Result<()> {
        let mut store = RepositoryConfigStore::load_or_default(&self.settings.repository_config)?;
        let name = entry.name.clone();
        store.add(entry)?;
        store.save()?;
        tracing::info!(repository = %name, "repository added");
        Ok(())
    }

    /// Remove repositories by name, purging their cached indexes.
    ///
    /// Stops at the first unknown name; earlier removals stay in effect.
    pub fn remove_repositories<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<RepositoryEntry>> {
        let mut store = self.load_configured()?;
        store.remove(names, &self.fetcher_cache())
    }

    /// Refresh every configured repository's cached index
    pub async fn sync_repositories(&self) -> Result<Vec<SyncReport>> {
        let store = self.load_configured()?;
        Ok(self.synchronizer.sync_all(store.entries()).await)
    }

    /// Search the cached indexes
    pub fn search_packages(&self, options: &SearchOptions) -> Result<Vec<ScoredResult>> {
        let store = self.load_configured()?;

        let constraint = effective_constraint(
            options.constraint.as_deref(),
            options.include_prerelease,
        );
        // Reject a bad constraint before touching the cache
        let resolver = ConstraintResolver::new(constraint, options.keep_all_versions)?;

        let index = SearchIndex::build(store.entries(), &self.fetcher_cache());
        let results = query::search(&index, &options.keyword, options.max_score, options.regex)?;
        Ok(resolver.apply(results))
    }

    /// Load the config, treating a missing file or an empty list as
    /// [`RepoError::NoRepositories`]
    fn load_configured(&self) -> Result<RepositoryConfigStore> {
        let store = match RepositoryConfigStore::load(&self.settings.repository_config) {
            Err(RepoError::ConfigNotFound { .. }) => return Err(RepoError::NoRepositories),
            other => other?,
        };
        if store.is_empty() {
            return Err(RepoError::NoRepositories);
        }
        Ok(store)
    }
}

/// Cache access addressed by the fetcher's cache paths
struct FetcherCache<'a, F>(&'a F);

impl<F: IndexFetcher> CacheReader for FetcherCache<'_, F> {
    fn load_index(&self, name: &str) -> Result<IndexDocument> {
        load_index_at(&self.0.cache_path(name))
    }
}

impl<F: IndexFetcher> CachePurge for FetcherCache<'_, F> {
    fn purge(&self, name: &str) -> Result<()> {
        purge_index(&self.0.cache_path(name), name)
    }
}
