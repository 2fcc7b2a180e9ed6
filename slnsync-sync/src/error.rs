//! Error types for slnsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use slnsync_core::CoreError;
use slnsync_project::ProjectError;
use slnsync_solution::SolutionError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Settings or solution path error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The solution could not be read.
    #[error("solution error: {0}")]
    Solution(#[from] SolutionError),

    /// A project could not be read or transformed.
    #[error("project error: {0}")]
    Project(#[from] ProjectError),

    /// The solution's directory does not exist.
    #[error("solution directory {path} does not exist")]
    SolutionDirectoryMissing { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
