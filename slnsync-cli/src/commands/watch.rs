//! `slnsync watch <solution>`: run the watcher in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for `slnsync watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Solution file to keep in sync.
    pub solution: PathBuf,
}

impl WatchArgs {
    pub fn run(self, verbose: bool) -> Result<()> {
        println!("Watching {} (ctrl-c to stop)", self.solution.display());
        slnsync_daemon::start_blocking(&self.solution, verbose)
            .with_context(|| format!("watcher failed for '{}'", self.solution.display()))
    }
}
