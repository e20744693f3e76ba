use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YearsortError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Filesystem errors
    #[error("Directory walker error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Destination already holds {0}")]
    AlreadyExists(String),

    // Metadata errors
    #[error("Metadata probe error: {0}")]
    Probe(String),

    #[error("Metadata probe timed out after {0:?}")]
    ProbeTimeout(Duration),

    #[error("Date parsing error: {0}")]
    InvalidDateFormat(String),

    // Backend errors
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Remote object not found: {0}")]
    RemoteNotFound(String),

    // User interaction
    #[error("Operation cancelled")]
    Cancelled,

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type for yearsort operations.
pub type Result<T> = std::result::Result<T, YearsortError>;
