//! `slnsync sync <solution>`: regenerate a solution and its projects.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use slnsync_sync::{Generator, ProjectOutcome};

use super::{open_solution, print_results};

/// Arguments for `slnsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Host-generated solution file (.sln or .slnx).
    pub solution: PathBuf,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate SDK-style projects for this run.
    #[arg(long, conflicts_with = "legacy")]
    pub sdk: bool,

    /// Generate legacy-style projects for this run.
    #[arg(long)]
    pub legacy: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let solution = open_solution(&self.solution)?;
        let mut generator = Generator::for_solution(&solution)
            .with_context(|| format!("failed to load settings for '{}'", self.solution.display()))?;
        if self.sdk || self.legacy {
            generator.settings_mut().generate_sdk_style_projects = self.sdk;
        }

        let report = generator
            .sync(&solution, self.dry_run)
            .with_context(|| format!("sync failed for '{}'", self.solution.display()))?;

        let label = solution
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        print_results(&label, &report.writes, self.dry_run);

        for outcome in &report.outcomes {
            if let ProjectOutcome::Dropped { project, reason } = outcome {
                println!(
                    "  {}  {} ({reason})",
                    "✗".red().bold(),
                    project.path.display()
                );
            }
        }
        if report.had_duplicates {
            println!(
                "{}",
                "warning: the solution listed some projects more than once".yellow()
            );
        }
        Ok(())
    }
}
