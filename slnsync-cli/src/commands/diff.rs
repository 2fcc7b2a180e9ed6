//! `slnsync diff <solution>`: show unified diffs for what sync would write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use slnsync_sync::{diff_solution, Generator};

use super::open_solution;

/// Arguments for `slnsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Solution file to diff.
    pub solution: PathBuf,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let solution = open_solution(&self.solution)?;
        let generator = Generator::for_solution(&solution)
            .with_context(|| format!("failed to load settings for '{}'", self.solution.display()))?;

        let diffs = diff_solution(&generator, &solution)
            .with_context(|| format!("diff failed for '{}'", self.solution.display()))?;

        if diffs.is_empty() {
            println!("No differences for '{}'.", self.solution.display());
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        Ok(())
    }
}
