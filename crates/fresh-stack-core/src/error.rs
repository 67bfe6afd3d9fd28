//! Error types shared across fresh-stack-core

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// The file-system operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOperation {
    /// Creating a directory.
    CreateDir,
    /// Writing a file.
    Write,
    /// Reading a file.
    Read,
    /// Removing a file.
    Remove,
    /// Moving a directory to its backup location.
    Move,
    /// Copying a tree (cross-device backup).
    Copy,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::CreateDir => "create directory",
            Self::Write => "write",
            Self::Read => "read",
            Self::Remove => "remove",
            Self::Move => "move",
            Self::Copy => "copy",
        };
        f.write_str(op)
    }
}

/// A failed file-system operation, carrying the path it touched.
#[derive(Error, Debug)]
#[error("failed to {operation} {}: {source}", path.display())]
pub struct FileSystemError {
    /// What was being attempted.
    pub operation: FsOperation,
    /// The path involved.
    pub path: PathBuf,
    /// The underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

impl FileSystemError {
    /// Build an error for `operation` on `path`.
    pub fn new(operation: FsOperation, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            operation,
            path: path.into(),
            source,
        }
    }
}
