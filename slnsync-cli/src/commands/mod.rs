pub mod diff;
pub mod init;
pub mod list;
pub mod patch;
pub mod project;
pub mod sync;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use slnsync_core::SolutionFile;
use slnsync_sync::WriteResult;

pub(crate) fn open_solution(path: &Path) -> Result<SolutionFile> {
    SolutionFile::new(path).with_context(|| format!("cannot open solution '{}'", path.display()))
}

pub(crate) fn print_results(label: &str, writes: &[WriteResult], dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let changed = writes.iter().filter(|r| r.is_change()).count();
    let unchanged = writes.len() - changed;

    if writes.is_empty() {
        println!("{prefix}✓ '{label}': nothing to do");
        return;
    }

    println!("{prefix}✓ '{label}' synced ({changed} written, {unchanged} unchanged)");

    for r in writes {
        match r {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Unchanged { path } => println!("  ·  {}", path.display()),
        }
    }
}
