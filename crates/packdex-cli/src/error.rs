//! CLI error types with exit code handling
//!
//! Library errors are mapped onto a small set of CLI errors, each with its
//! own exit code.

use miette::Diagnostic;
use packdex_repo::RepoError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The user supplied something unusable
    #[error("{message}")]
    #[diagnostic(code(packdex::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Repository configuration problem
    #[error("{message}")]
    #[diagnostic(code(packdex::cli::repository))]
    Repository {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(packdex::cli::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(packdex::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::Repository { .. } => exit_codes::REPOSITORY_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    fn repository(message: impl Into<String>, help: Option<&str>) -> Self {
        Self::Repository {
            message: message.into(),
            help: help.map(str::to_string),
        }
    }

    /// Create an error for output that could not be rendered
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::InvalidPattern { .. } => CliError::input_with_help(
                message,
                "Patterns use Rust regex syntax, e.g. '^nginx' or 'redis|valkey'",
            ),
            RepoError::InvalidConstraint { .. } => CliError::input_with_help(
                message,
                "Use a semver constraint such as '>=1.2.0', '^2' or '~1.4 || >=3.0.0'",
            ),
            RepoError::InvalidRepository { .. } => CliError::input(message),
            RepoError::NoRepositories => CliError::repository(message, None),
            RepoError::RepositoryNotFound { .. } => {
                CliError::repository(message, Some("List configured repositories with 'packdex repo list'"))
            }
            RepoError::RepositoryAlreadyExists { .. } => CliError::repository(
                message,
                Some("Remove it first with 'packdex repo remove <name>'"),
            ),
            RepoError::ConfigNotFound { .. } | RepoError::InvalidConfig { .. } => {
                CliError::repository(message, None)
            }
            RepoError::Io(_) | RepoError::WriteFailed { .. } => CliError::Io { message },
            _ => CliError::Other { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
