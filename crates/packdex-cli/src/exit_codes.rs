//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - invalid search pattern, version constraint or repository
pub const INPUT_ERROR: i32 = 2;

/// Repository error - unknown, duplicate or missing repositories
pub const REPOSITORY_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
