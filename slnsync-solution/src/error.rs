//! Error types for slnsync-solution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort reading or writing a whole solution.
#[derive(Debug, Error)]
pub enum SolutionError {
    /// The XML solution dialect could not be read.
    #[error("malformed XML solution: {message}")]
    Xml { message: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single malformed solution entry. The parser records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIssue {
    #[error("project entry at byte {offset} has no matching EndProject")]
    MissingEndProject { offset: usize },

    #[error("project entry at byte {offset} does not have three comma-separated fields")]
    MissingFields { offset: usize },

    #[error("project entry at byte {offset} has an empty path")]
    EmptyPath { offset: usize },

    #[error("project entry at byte {offset} has no quoted identifier")]
    MissingIdentifier { offset: usize },

    #[error("project element at byte {offset} has no Path attribute")]
    MissingPathAttribute { offset: usize },
}

pub(crate) fn xml_err(e: impl std::fmt::Display) -> SolutionError {
    SolutionError::Xml {
        message: e.to_string(),
    }
}
