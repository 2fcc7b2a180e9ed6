//! Dry-run unified diff support for `slnsync diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use slnsync_core::SolutionFile;

use crate::error::io_err;
use crate::pipeline::{Generator, PlannedWrite, SyncPlan};
use crate::SyncError;

/// A single pending file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Plan a sync of `solution` and compare every pending write with what is
/// on disk. No files are written.
pub fn diff_solution(generator: &Generator, solution: &SolutionFile) -> Result<Vec<FileDiff>, SyncError> {
    let plan = generator.plan(solution)?;
    diff_plan(&plan, solution)
}

/// Diffs of the writes in `plan` (solution last) whose content differs from
/// the current file.
pub fn diff_plan(plan: &SyncPlan, solution: &SolutionFile) -> Result<Vec<FileDiff>, SyncError> {
    let solution_write = PlannedWrite {
        path: solution.path().to_path_buf(),
        content: plan.solution_text.clone(),
    };

    let mut diffs = Vec::new();
    for write in plan.writes.iter().chain(std::iter::once(&solution_write)) {
        let existing = read_existing_or_empty(&write.path)?;
        if existing == write.content {
            continue;
        }

        let relative = write
            .path
            .strip_prefix(solution.directory())
            .unwrap_or(write.path.as_path());
        let old_header = format!("a/{}", relative.display());
        let new_header = format!("b/{}", relative.display());
        let unified = TextDiff::from_lines(&existing, &write.content)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(FileDiff {
            path: write.path.clone(),
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}
