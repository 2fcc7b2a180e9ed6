//! slnsync core library: domain types, path helpers, pattern matching,
//! settings persistence, errors.
//!
//! - [`types`]: [`ProjectFile`], [`SolutionFile`] and friends
//! - [`pattern`]: wildcard exclusion patterns
//! - [`paths`]: lexical path resolution
//! - [`settings`]: load / save / init of `slnsync.yaml`
//! - [`error`]: [`CoreError`]

pub mod error;
pub mod paths;
pub mod pattern;
pub mod settings;
pub mod types;

/// Platform line ending used for generated text.
#[cfg(windows)]
pub const NEWLINE: &str = "\r\n";
/// Platform line ending used for generated text.
#[cfg(not(windows))]
pub const NEWLINE: &str = "\n";

pub use error::CoreError;
pub use pattern::{ExclusionPattern, PatternSet};
pub use settings::{PropertySetting, Settings};
pub use types::{ProjectFile, ProjectId, SolutionFile, SolutionFormat};
