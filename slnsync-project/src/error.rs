//! Error types for slnsync-project.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while reading or transforming a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Malformed XML, before the owning file is known.
    #[error("malformed XML: {message}")]
    Xml { message: String },

    /// The project file is malformed XML or lacks a `Project` root.
    #[error("invalid project file {path}: {message}")]
    Format { path: PathBuf, message: String },

    /// The project does not reference exactly one assembly definition.
    #[error("{path} must reference exactly one .asmdef file, found {found}")]
    ReferenceResolution { path: PathBuf, found: usize },

    /// An assembly definition file could not be read as JSON.
    #[error("failed to parse assembly definition {path}: {source}")]
    AssemblyDefinition {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectError {
    /// Attach the file path to a bare XML error.
    pub(crate) fn at(self, path: impl Into<PathBuf>) -> ProjectError {
        match self {
            ProjectError::Xml { message } => ProjectError::Format {
                path: path.into(),
                message,
            },
            other => other,
        }
    }
}

pub(crate) fn format_err(e: impl std::fmt::Display) -> ProjectError {
    ProjectError::Xml {
        message: e.to_string(),
    }
}

/// Convenience constructor for [`ProjectError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ProjectError {
    ProjectError::Io {
        path: path.into(),
        source,
    }
}
