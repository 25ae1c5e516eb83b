// Central Error Type for the Application

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
///
/// Only setup and checkpoint failures live here. Per-item solver failures are
/// `SolveError`s and never leave the scheduler.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid corpus root: {0} is not a directory")]
    InvalidRoot(PathBuf),

    #[error("Checkpoint IO error on {path}: {source}")]
    CheckpointIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed checkpoint: {0}")]
    CheckpointFormat(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn checkpoint_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::CheckpointIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_checkpoint_io_keeps_path_and_source() {
        let err = AppError::checkpoint_io(
            "out/cnf.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        assert!(err.to_string().contains("out/cnf.csv"));
        assert!(err.to_string().contains("denied"));
        assert!(err.source().is_some());
    }
}
