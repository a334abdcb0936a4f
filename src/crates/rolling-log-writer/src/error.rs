use log_roller::RollerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing to rolling log files.
#[derive(Error, Debug)]
pub enum WriterError {
    /// Rejected configuration, reported before any file is touched
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Records were emitted after the rolling file was disposed
    #[error("the rolling log file has been disposed")]
    Disposed,

    /// Every candidate file was held by another writer
    #[error("{} is locked by another writer, gave up after {attempts} attempts", .path.display())]
    RetriesExhausted { path: PathBuf, attempts: usize },

    /// The sequence number cannot grow any further
    #[error("sequence numbers after {last} are exhausted")]
    SequenceExhausted { last: u32 },

    /// Every archive name tried for the kept file name was already taken
    #[error("{} and {collisions} archive names before it already exist", .path.display())]
    NameCollisions { path: PathBuf, collisions: usize },

    /// No file is open after alignment
    #[error("no active log file")]
    NoActiveFile,

    /// I/O error when interacting with filesystem
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The base path cannot be used as a file name template
    #[error("invalid path: {0}")]
    Roller(#[from] RollerError),
}

impl From<WriterError> for std::io::Error {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::Io(err) => err,
            other => std::io::Error::other(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, WriterError>;
