//! # slnsync-sync
//!
//! Hash-gated atomic writer, source file patcher and the solution sync
//! pipeline.
//!
//! Call [`run`] to regenerate a solution with the settings stored next to
//! it, or build a [`Generator`] to keep its generation cache across runs.

pub mod cache;
pub mod diff;
pub mod error;
pub mod patcher;
pub mod pipeline;
pub mod writer;

pub use cache::{GenerationCache, DEBOUNCE_WINDOW};
pub use diff::{diff_plan, diff_solution, FileDiff};
pub use error::SyncError;
pub use patcher::{
    ensure_marker_line, ensure_marker_lines, insert_marker, patch_solution_sources, PatchSummary,
};
pub use pipeline::{
    host_project_path, run, Generator, PlannedWrite, ProjectOutcome, SyncPlan, SyncReport,
};
pub use writer::{write_bytes_if_changed, write_if_changed, WriteResult};
