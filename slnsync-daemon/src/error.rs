use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the watcher runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("settings error: {0}")]
    Core(#[from] slnsync_core::CoreError),

    #[error("solution error: {0}")]
    Solution(#[from] slnsync_solution::SolutionError),

    #[error("sync error: {0}")]
    Sync(#[from] slnsync_sync::SyncError),

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
