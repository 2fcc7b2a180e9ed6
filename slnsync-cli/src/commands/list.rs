//! `slnsync list <solution>`: show the projects a solution references.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use slnsync_core::paths::{is_direct_child, relative_to};
use slnsync_core::SolutionFile;
use slnsync_solution::{parse_solution, ParsedSolution};

use super::open_solution;

/// Arguments for `slnsync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Solution file to inspect.
    pub solution: PathBuf,

    /// Only list projects that sit directly in the solution directory.
    #[arg(long)]
    pub local_only: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ListJson {
    solution: PathBuf,
    had_duplicates: bool,
    issues: Vec<String>,
    projects: Vec<ProjectJson>,
}

#[derive(Debug, Serialize)]
struct ProjectJson {
    name: String,
    id: String,
    path: PathBuf,
    local: bool,
    exists: bool,
}

#[derive(Tabled)]
struct ProjectTableRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "location")]
    location: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let solution = open_solution(&self.solution)?;
        let text = std::fs::read_to_string(solution.path())
            .with_context(|| format!("cannot read '{}'", solution.path().display()))?;
        let parsed = parse_solution(&solution, &text, self.local_only)
            .with_context(|| format!("cannot parse '{}'", solution.path().display()))?;

        let report = build_report(&solution, parsed);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize list JSON")?
            );
            return Ok(());
        }

        print_table(report);
        Ok(())
    }
}

fn build_report(solution: &SolutionFile, parsed: ParsedSolution) -> ListJson {
    let projects = parsed
        .projects
        .into_iter()
        .map(|project| ProjectJson {
            name: project.name(),
            id: project.id.0.clone(),
            local: is_direct_child(solution.directory(), &project.path),
            exists: project.path.is_file(),
            path: project.path,
        })
        .collect();

    ListJson {
        solution: solution.path().to_path_buf(),
        had_duplicates: parsed.had_duplicates,
        issues: parsed.issues.iter().map(ToString::to_string).collect(),
        projects,
    }
}

fn print_table(report: ListJson) {
    println!(
        "{} | {} projects",
        report.solution.display().to_string().bold(),
        report.projects.len()
    );

    if report.projects.is_empty() {
        println!("No projects listed.");
    } else {
        let directory = report
            .solution
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default();
        let rows: Vec<ProjectTableRow> = report
            .projects
            .into_iter()
            .map(|p| ProjectTableRow {
                location: location_label(&p),
                path: relative_to(&directory, &p.path).display().to_string(),
                name: p.name,
                id: p.id,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    if report.had_duplicates {
        println!("{}", "Some projects are listed more than once.".yellow());
    }
    for issue in &report.issues {
        println!("{} {issue}", "skipped:".red().bold());
    }
}

fn location_label(project: &ProjectJson) -> String {
    let label = if project.local { "local" } else { "generated" };
    if project.exists {
        label.green().to_string()
    } else {
        format!("{label} (missing)").red().to_string()
    }
}
