//! `slnsync init <solution>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use slnsync_core::settings;

use super::open_solution;

/// Write a default slnsync.yaml next to a solution.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Solution the settings belong to.
    pub solution: PathBuf,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let solution = open_solution(&self.solution)?;
        let dir = solution.directory();
        let path = settings::settings_path_at(dir);
        let existed = path.exists();

        settings::init_at(dir)
            .with_context(|| format!("failed to initialize '{}'", path.display()))?;

        if existed {
            println!("✓ Settings already present at {}", path.display());
        } else {
            println!("✓ Wrote default settings to {}", path.display());
        }
        Ok(())
    }
}
