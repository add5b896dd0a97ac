//! Error types for repository operations

use std::path::PathBuf;

use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Repository configuration not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid repository configuration: {message}")]
    InvalidConfig { message: String },

    #[error("No repositories configured. Add one with 'packdex repo add <name> <url>'")]
    NoRepositories,

    #[error("No repo named \"{name}\" found")]
    RepositoryNotFound { name: String },

    #[error("Repository name ({name}) already exists, please specify a different name")]
    RepositoryAlreadyExists { name: String },

    #[error("Invalid repository \"{name}\": {reason}")]
    InvalidRepository { name: String, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Authentication required for {url}")]
    AuthRequired { url: String },

    // ============ Index Errors ============
    #[error("Index parse error: {message}")]
    IndexParseError { message: String },

    // ============ Search Errors ============
    #[error("Invalid search pattern \"{pattern}\": {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("An invalid version/constraint format \"{constraint}\": {message}")]
    InvalidConstraint { constraint: String, message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RepoError::Timeout { seconds: 30 }
        } else if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}
