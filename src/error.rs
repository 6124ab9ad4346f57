// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for Slurpy
#[derive(Error, Debug)]
pub enum Error {
    /// The queried package does not exist in the AUR
    #[error("package not found: {0}")]
    NotFound(String),

    /// The AUR answered with a structured error other than "not found"
    #[error("{0}")]
    Rpc(String),

    /// A file or directory we would write to already exists
    #[error("{} exists, pass --force to overwrite", .0.display())]
    TargetExists(PathBuf),

    /// A downloaded archive could not be unpacked
    #[error("error extracting archive: {0}")]
    Extraction(String),

    /// HTTP transport or status errors
    #[error("download error: {0}")]
    Download(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed data (RPC payloads, sync databases)
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration file errors
    #[error("configuration error: {0}")]
    Config(String),

    /// The download target directory is unusable
    #[error("{} does not exist or is not a directory", .0.display())]
    TargetDir(PathBuf),

    /// An external command (pacman) failed
    #[error("command failed: {0}")]
    Command(String),

    /// Client initialization error
    #[error("initialization failed: {0}")]
    InitError(String),
}

impl Error {
    /// True when the error only means "the AUR does not know this name"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias using Slurpy's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A failure confined to a single package during a multi-package run
#[derive(Debug)]
pub struct PackageFailure {
    pub name: String,
    pub error: Error,
}

impl PackageFailure {
    pub fn new(name: impl Into<String>, error: Error) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl std::fmt::Display for PackageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}
