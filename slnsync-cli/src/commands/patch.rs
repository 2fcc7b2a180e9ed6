//! `slnsync patch`: insert `#nullable enable` into source files.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use slnsync_sync::{ensure_marker_lines, patch_solution_sources, PatchSummary};

use super::open_solution;

/// Arguments for `slnsync patch`.
#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Patch every source file compiled by the solution's projects.
    #[arg(required_unless_present = "files", conflicts_with = "files")]
    pub solution: Option<PathBuf>,

    /// Patch only these files.
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,
}

impl PatchArgs {
    pub fn run(self) -> Result<()> {
        let summary = match (&self.solution, self.files.is_empty()) {
            (Some(path), _) => {
                let solution = open_solution(path)?;
                patch_solution_sources(&solution)
                    .with_context(|| format!("patch failed for '{}'", path.display()))?
            }
            (None, false) => ensure_marker_lines(&self.files),
            (None, true) => bail!("provide a solution or at least one --file"),
        };

        print_summary(&summary);
        if summary.failed > 0 {
            bail!("{} file(s) could not be patched", summary.failed);
        }
        Ok(())
    }
}

fn print_summary(summary: &PatchSummary) {
    println!(
        "✓ {} patched, {} already marked, {}",
        summary.patched,
        summary.unchanged,
        if summary.failed == 0 {
            "0 failed".normal()
        } else {
            format!("{} failed", summary.failed).red().bold()
        }
    );
}
