//! packdex repository index search
//!
//! This crate keeps a local, searchable view of Helm-style chart
//! repositories:
//!
//! - **Configuration**: an ordered `repositories.yaml` of named repositories
//! - **Synchronization**: concurrent index refresh, one report per repository
//! - **Cache**: `<name>-index.yaml` and `<name>-charts.txt` per repository
//! - **Search**: keyword, fuzzy or regex matching over every cached index
//! - **Constraints**: Helm-style version constraints with stable/devel defaults
//!
//! ## Example
//!
//! ```rust,no_run
//! use packdex_repo::{RepoManager, RepositoryEntry, SearchOptions, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = RepoManager::new(Settings::from_default_dirs()?)?;
//!
//! // Add a repository and fetch its index
//! manager.add_repository(RepositoryEntry::new("bitnami", "https://charts.bitnami.com/bitnami")?)?;
//! for report in manager.sync_repositories().await? {
//!     println!("{}: {:?}", report.repository_name, report.outcome);
//! }
//!
//! // Newest stable nginx of every repository
//! for hit in manager.search_packages(&SearchOptions::new("nginx"))? {
//!     println!("{} {}", hit.qualified_name(), hit.version_entry.version);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod config;
pub mod index;
pub mod cache;
pub mod fetcher;
pub mod sync;
pub mod search;
pub mod query;
pub mod constraint;
pub mod settings;
pub mod manager;

mod fs;

// Re-exports
pub use error::{RepoError, Result};
pub use config::{RepoAuth, RepositoryConfigStore, RepositoryEntry, RepositoryFile};
pub use index::{IndexDocument, VersionEntry};
pub use cache::{CachePurge, CacheReader, IndexCache};
pub use fetcher::{HttpFetcher, IndexFetcher};
pub use sync::{IndexSynchronizer, SyncOutcome, SyncReport};
pub use search::{IndexRow, LoadOutcome, SearchIndex};
pub use query::{DEFAULT_MAX_SCORE, ScoredResult};
pub use constraint::{Constraint, ConstraintResolver, DEVEL_CONSTRAINT, STABLE_CONSTRAINT};
pub use settings::Settings;
pub use manager::{RepoManager, SearchOptions};
