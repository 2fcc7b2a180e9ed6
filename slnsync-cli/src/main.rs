//! slnsync: keep IDE solutions and projects in step with the game
//! editor's generated ones.
//!
//! # Usage
//!
//! ```text
//! slnsync init <solution>
//! slnsync sync <solution> [--dry-run] [--sdk | --legacy]
//! slnsync project <csproj> [--solution <solution>] [--dry-run]
//! slnsync list <solution> [--local-only] [--json]
//! slnsync diff <solution>
//! slnsync patch <solution> | --file <path>...
//! slnsync watch <solution>
//! ```

mod commands;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, init::InitArgs, list::ListArgs, patch::PatchArgs, project::ProjectArgs,
    sync::SyncArgs, watch::WatchArgs,
};
use slnsync_core::settings;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "slnsync",
    version,
    about = "Regenerate IDE solutions and projects from editor-generated ones",
    long_about = None,
)]
struct Cli {
    /// Log debug output.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default slnsync.yaml next to a solution.
    Init(InitArgs),

    /// Regenerate a solution and every project it lists.
    Sync(SyncArgs),

    /// Regenerate a single project file.
    Project(ProjectArgs),

    /// List the projects a solution references.
    List(ListArgs),

    /// Show unified diffs of what sync would write.
    Diff(DiffArgs),

    /// Insert `#nullable enable` into source files.
    Patch(PatchArgs),

    /// Watch a solution and keep it in sync until ctrl-c.
    Watch(WatchArgs),
}

impl Commands {
    /// Directory whose slnsync.yaml configures this invocation.
    fn settings_directory(&self) -> Option<&Path> {
        match self {
            Commands::Init(args) => args.solution.parent(),
            Commands::Sync(args) => args.solution.parent(),
            Commands::Project(args) => args.settings_directory(),
            Commands::List(args) => args.solution.parent(),
            Commands::Diff(args) => args.solution.parent(),
            Commands::Patch(args) => args.solution.as_deref().and_then(Path::parent),
            Commands::Watch(args) => args.solution.parent(),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_verbose = cli
        .command
        .settings_directory()
        .and_then(|dir| settings::load_at(dir).ok())
        .is_some_and(|s| s.log_verbose);
    let verbose = cli.verbose || log_verbose;

    slnsync_daemon::init_tracing(verbose);

    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Project(args) => args.run(),
        Commands::List(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Patch(args) => args.run(),
        Commands::Watch(args) => args.run(verbose),
    }
}
