//! Locations and knobs shared by every repository operation
//!
//! Settings are passed explicitly; nothing here is global.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RepoError, Result};
use crate::fetcher::DEFAULT_TIMEOUT;

/// Environment variable overriding the repository config file
pub const REPOSITORY_CONFIG_ENV: &str = "PACKDEX_REPOSITORY_CONFIG";

/// Environment variable overriding the cache directory
pub const REPOSITORY_CACHE_ENV: &str = "PACKDEX_REPOSITORY_CACHE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path of `repositories.yaml`
    pub repository_config: PathBuf,
    /// Directory holding cached indexes
    pub repository_cache: PathBuf,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl Settings {
    pub fn new(repository_config: impl Into<PathBuf>, repository_cache: impl Into<PathBuf>) -> Self {
        Self {
            repository_config: repository_config.into(),
            repository_cache: repository_cache.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Settings rooted in the user's config and cache directories
    pub fn from_default_dirs() -> Result<Self> {
        Ok(Self::new(default_config_path()?, default_cache_dir()?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Default `repositories.yaml` location
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| RepoError::InvalidConfig {
        message: "Could not determine config directory".to_string(),
    })?;
    Ok(config_dir.join("packdex").join("repositories.yaml"))
}

/// Default cache directory
pub fn default_cache_dir() -> Result<PathBuf> {
    crate::cache::IndexCache::default_dir()
}
