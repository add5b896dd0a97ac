//! Fetching remote repository indexes
//!
//! [`IndexFetcher`] is the seam between synchronization and transport.
//! [`HttpFetcher`] is the default implementation: HTTP(S) through reqwest,
//! plus `file://` repositories read straight from disk.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::cache::IndexCache;
use crate::config::{RepoAuth, RepositoryEntry};
use crate::error::{RepoError, Result};
use crate::index::IndexDocument;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves a repository's index document
#[async_trait]
pub trait IndexFetcher: Send + Sync {
    /// Download and parse the index of `entry`
    async fn fetch(&self, entry: &RepositoryEntry) -> Result<IndexDocument>;

    /// Where the index of repository `name` is cached
    fn cache_path(&self, name: &str) -> PathBuf;
}

/// Fetches `index.yaml` over HTTP(S) or from a local directory
pub struct HttpFetcher {
    cache: IndexCache,
    client: reqwest::Client,
    /// Same settings, but accepts invalid certificates
    insecure_client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher writing into `cache` with the default timeout
    pub fn new(cache: IndexCache) -> Result<Self> {
        Self::with_timeout(cache, DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a custom request timeout
    pub fn with_timeout(cache: IndexCache, timeout: Duration) -> Result<Self> {
        Ok(Self {
            cache,
            client: build_client(timeout, false)?,
            insecure_client: build_client(timeout, true)?,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get(&self, entry: &RepositoryEntry, url: Url) -> Result<Vec<u8>> {
        let client = if entry.insecure_skip_tls_verify {
            tracing::warn!(repository = %entry.name, "TLS verification disabled");
            &self.insecure_client
        } else {
            &self.client
        };

        // reqwest drops the Authorization header on cross-host redirects
        let mut request = client.get(url.clone());
        request = match &entry.auth {
            Some(RepoAuth::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(RepoAuth::Bearer { token }) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(RepoError::AuthRequired {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                message: format!("failed to fetch {}", url),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(bytes.to_vec())
    }

    fn map_error(&self, e: reqwest::Error) -> RepoError {
        if e.is_timeout() {
            RepoError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            e.into()
        }
    }
}

#[async_trait]
impl IndexFetcher for HttpFetcher {
    async fn fetch(&self, entry: &RepositoryEntry) -> Result<IndexDocument> {
        let index_url = entry.index_url();
        let url = Url::parse(&index_url).map_err(|e| RepoError::InvalidRepository {
            name: entry.name.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(repository = %entry.name, url = %url, "fetching index");

        let bytes = match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| RepoError::InvalidRepository {
                        name: entry.name.clone(),
                        reason: format!("not a local path: {}", index_url),
                    })?;
                tokio::fs::read(&path).await?
            }
            "http" | "https" => self.get(entry, url).await?,
            other => {
                return Err(RepoError::InvalidRepository {
                    name: entry.name.clone(),
                    reason: format!("unsupported URL scheme '{}'", other),
                });
            }
        };

        IndexDocument::from_bytes(&bytes)
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache.index_path(name)
    }
}

fn build_client(timeout: Duration, accept_invalid_certs: bool) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("packdex/", env!("CARGO_PKG_VERSION")))
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })
}
