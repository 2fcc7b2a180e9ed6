//! `slnsync project <csproj>`: regenerate one project file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use slnsync_core::settings;
use slnsync_sync::Generator;

use super::print_results;

/// Arguments for `slnsync project`.
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Host-generated project file.
    pub project: PathBuf,

    /// Solution whose slnsync.yaml applies; defaults to the project's
    /// directory.
    #[arg(long)]
    pub solution: Option<PathBuf>,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,
}

impl ProjectArgs {
    pub(crate) fn settings_directory(&self) -> Option<&Path> {
        self.solution
            .as_deref()
            .unwrap_or(self.project.as_path())
            .parent()
    }

    pub fn run(self) -> Result<()> {
        let dir = self.settings_directory().unwrap_or(Path::new("."));
        let settings = settings::load_at(dir)
            .with_context(|| format!("failed to load settings from '{}'", dir.display()))?;
        let generator = Generator::new(settings);

        let project = if self.project.is_absolute() {
            self.project.clone()
        } else {
            std::env::current_dir()
                .context("could not determine current directory")?
                .join(&self.project)
        };
        let writes = generator
            .generate_project(&project, self.dry_run)
            .with_context(|| format!("failed to generate '{}'", self.project.display()))?;

        let label = self
            .project
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        print_results(&label, &writes, self.dry_run);
        Ok(())
    }
}
