use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when building a [`PathRoller`](crate::PathRoller)
#[derive(Debug, Error)]
pub enum RollerError {
    /// The base path cannot be used as a log file template
    #[error("invalid log file path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },
}

/// A specialized Result type for path rolling operations
pub type Result<T> = std::result::Result<T, RollerError>;
