//! Solution sync pipeline shared by the CLI and the daemon.
//!
//! A run goes `Parse → TransformEach → MergeAdditional → Write`. Only
//! solution-level failures abort a run; every project is handled on its own
//! and reported as a [`ProjectOutcome`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use slnsync_core::paths::{is_direct_child, resolve};
use slnsync_core::{settings, ProjectFile, Settings, SolutionFile};
use slnsync_project::document::PROJECT_EXTENSION;
use slnsync_project::{
    assembly_definition_name, generate_project, resharper, ProjectDocument, ProjectStyle,
    ReferenceResolver,
};
use slnsync_solution::{parse_solution, write_to, write_to_text};

use crate::cache::GenerationCache;
use crate::error::{io_err, SyncError};
use crate::writer::{write_bytes_if_changed, write_if_changed, WriteResult};

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A file the pipeline wants on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub path: PathBuf,
    pub content: String,
}

/// What happened to one solution entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectOutcome {
    /// Transformed and relocated next to its assembly definition.
    Generated { project: ProjectFile },
    /// Package-cache project, listed unchanged.
    PassedThrough { project: ProjectFile },
    /// No host project to generate from; the entry keeps its resolved path.
    Retained { project: ProjectFile },
    /// Left out of the solution.
    Dropped { project: ProjectFile, reason: String },
}

impl ProjectOutcome {
    pub fn project(&self) -> &ProjectFile {
        match self {
            ProjectOutcome::Generated { project }
            | ProjectOutcome::PassedThrough { project }
            | ProjectOutcome::Retained { project }
            | ProjectOutcome::Dropped { project, .. } => project,
        }
    }
}

/// Everything a sync run would write, computed without touching disk.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Generated project files and settings files.
    pub writes: Vec<PlannedWrite>,
    /// Solution entries in output order.
    pub projects: Vec<ProjectFile>,
    /// Rendered solution.
    pub solution_text: String,
    pub outcomes: Vec<ProjectOutcome>,
    pub had_duplicates: bool,
}

/// Result of [`Generator::sync`].
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Every file write, solution last.
    pub writes: Vec<WriteResult>,
    pub outcomes: Vec<ProjectOutcome>,
    pub had_duplicates: bool,
    /// The solution was reused from the generation cache.
    pub cached: bool,
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Runs the pipeline with one set of settings.
#[derive(Debug, Default)]
pub struct Generator {
    settings: Settings,
    cache: GenerationCache,
}

impl Generator {
    pub fn new(settings: Settings) -> Self {
        Self::with_cache(settings, GenerationCache::default())
    }

    pub fn with_cache(settings: Settings, cache: GenerationCache) -> Self {
        Self { settings, cache }
    }

    /// Generator configured by the `slnsync.yaml` next to `solution`.
    pub fn for_solution(solution: &SolutionFile) -> Result<Self, SyncError> {
        Ok(Self::new(settings::load_at(solution.directory())?))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        self.cache.mark_as_changed();
        &mut self.settings
    }

    pub fn style(&self) -> ProjectStyle {
        ProjectStyle::from_settings(&self.settings)
    }

    /// Drop the cached solution so the next run regenerates.
    pub fn mark_as_changed(&mut self) {
        self.cache.mark_as_changed();
    }

    /// Compute every pending write for the solution on disk.
    pub fn plan(&self, solution: &SolutionFile) -> Result<SyncPlan, SyncError> {
        let text = read_solution(solution)?;
        self.plan_text(solution, &text, false)
    }

    /// Regenerate the solution on disk, writing only files whose content
    /// changed.
    pub fn sync(&mut self, solution: &SolutionFile, dry_run: bool) -> Result<SyncReport, SyncError> {
        let text = read_solution(solution)?;

        if let Some(cached) = self.cache.lookup(&text, Instant::now()) {
            tracing::debug!(solution = %solution.path().display(), "reusing generated solution");
            let result = write_bytes_if_changed(solution.path(), cached.as_bytes(), dry_run)?;
            return Ok(SyncReport {
                writes: vec![result],
                outcomes: Vec::new(),
                had_duplicates: false,
                cached: true,
            });
        }

        let plan = self.plan_text(solution, &text, false)?;
        let mut writes = apply_writes(&plan.writes, dry_run);

        let projects = &plan.projects;
        let result = write_if_changed(
            solution.path(),
            |mut out: &mut dyn Write| write_to(&mut out, solution, projects),
            dry_run,
        )?;
        writes.push(result);

        if !dry_run {
            self.cache
                .store(text, plan.solution_text, plan.had_duplicates, Instant::now());
        }

        log_outcomes(solution, &plan.outcomes);
        Ok(SyncReport {
            writes,
            outcomes: plan.outcomes,
            had_duplicates: plan.had_duplicates,
            cached: false,
        })
    }

    /// The solution the IDE should see in place of the host-generated
    /// `content`. Generated projects are written as a side effect.
    ///
    /// Never fails: on any error the host content is returned unchanged.
    pub fn generate_solution_text(&mut self, solution: &SolutionFile, content: &str) -> String {
        if !self.settings.enabled {
            return remove_generated_projects(solution, content);
        }

        let now = Instant::now();
        if let Some(cached) = self.cache.lookup(content, now) {
            tracing::debug!(solution = %solution.path().display(), "reusing generated solution");
            return cached.to_owned();
        }

        let plan = match self.plan_text(solution, content, true) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(
                    solution = %solution.path().display(),
                    error = %e,
                    "generating solution failed; keeping host content"
                );
                return content.to_owned();
            }
        };

        apply_writes(&plan.writes, false);
        log_outcomes(solution, &plan.outcomes);
        self.cache.store(
            content.to_owned(),
            plan.solution_text.clone(),
            plan.had_duplicates,
            now,
        );
        plan.solution_text
    }

    /// Regenerate a single host project file.
    ///
    /// Package-cache projects are left alone; the returned list is empty for
    /// them and when the generator is disabled.
    pub fn generate_project(
        &self,
        project_path: &Path,
        dry_run: bool,
    ) -> Result<Vec<WriteResult>, SyncError> {
        if !self.settings.enabled {
            tracing::debug!(project = %project_path.display(), "generator disabled");
            return Ok(Vec::new());
        }

        let model = ProjectDocument::load(project_path)?;
        if model.is_from_package_cache()? {
            tracing::debug!(
                project = %model.name(),
                "package project; leaving it unchanged"
            );
            return Ok(Vec::new());
        }

        let mut writes = Vec::new();
        self.plan_generation(model, &mut ReferenceResolver::new(), &mut writes)?;
        let mut results = Vec::with_capacity(writes.len());
        for write in &writes {
            results.push(write_bytes_if_changed(
                &write.path,
                write.content.as_bytes(),
                dry_run,
            )?);
        }
        Ok(results)
    }

    // -- stages -------------------------------------------------------------

    fn plan_text(
        &self,
        solution: &SolutionFile,
        text: &str,
        include_only_local: bool,
    ) -> Result<SyncPlan, SyncError> {
        let directory = solution.directory();
        if !directory.is_dir() {
            return Err(SyncError::SolutionDirectoryMissing {
                path: directory.to_path_buf(),
            });
        }

        let parsed = parse_solution(solution, text, include_only_local)?;

        let mut resolver = ReferenceResolver::new();
        let mut writes = Vec::new();
        let mut outcomes = Vec::with_capacity(parsed.projects.len());
        let mut projects = Vec::with_capacity(parsed.projects.len());
        for project in &parsed.projects {
            let outcome = self.transform_entry(directory, project, &mut resolver, &mut writes);
            if !matches!(outcome, ProjectOutcome::Dropped { .. }) {
                projects.push(outcome.project().clone());
            }
            outcomes.push(outcome);
        }

        self.merge_additional(directory, &mut projects);

        let solution_text = write_to_text(solution, &projects);
        Ok(SyncPlan {
            writes,
            projects,
            solution_text,
            outcomes,
            had_duplicates: parsed.had_duplicates,
        })
    }

    fn transform_entry(
        &self,
        solution_directory: &Path,
        project: &ProjectFile,
        resolver: &mut ReferenceResolver,
        writes: &mut Vec<PlannedWrite>,
    ) -> ProjectOutcome {
        let dropped = |reason: String| ProjectOutcome::Dropped {
            project: project.clone(),
            reason,
        };

        if !project.path.is_file() {
            tracing::warn!(project = %project.path.display(), "project file does not exist");
            return dropped("project file does not exist".into());
        }

        let host = host_project_path(solution_directory, &project.path);
        let source = host.as_deref().unwrap_or(&project.path);
        let model = match ProjectDocument::load(source) {
            Ok(model) => model,
            Err(e) => {
                tracing::error!(project = %source.display(), error = %e, "cannot read project");
                return dropped(e.to_string());
            }
        };
        let marker = match model.assembly_definition_path() {
            Ok(marker) => marker.to_path_buf(),
            Err(e) => {
                tracing::error!(project = %source.display(), error = %e, "cannot locate assembly definition");
                return dropped(e.to_string());
            }
        };
        if !marker.is_file() {
            tracing::warn!(
                project = %source.display(),
                assembly_definition = %marker.display(),
                "assembly definition does not exist"
            );
            return dropped(format!("{} does not exist", marker.display()));
        }
        if slnsync_core::paths::is_package_cache_path(&marker) {
            tracing::debug!(project = %project.name(), "package project; passing through");
            return ProjectOutcome::PassedThrough {
                project: project.clone(),
            };
        }

        if host.is_none() {
            let path = resolver.determine_new_project_file_path(&project.path);
            return ProjectOutcome::Retained {
                project: project.with_path(path),
            };
        }

        match self.plan_generation(model, resolver, writes) {
            Ok(output_path) => ProjectOutcome::Generated {
                project: project.with_path(output_path),
            },
            Err(e) => {
                tracing::error!(project = %source.display(), error = %e, "generating project failed");
                dropped(e.to_string())
            }
        }
    }

    /// Transform `model` and queue its output (and settings file), returning
    /// the output path.
    fn plan_generation(
        &self,
        model: ProjectDocument,
        resolver: &mut ReferenceResolver,
        writes: &mut Vec<PlannedWrite>,
    ) -> Result<PathBuf, SyncError> {
        let generated = generate_project(self.style(), model, &self.settings, resolver)?;

        if self.settings.generate_resharper_settings {
            let settings_path = resharper::settings_path(&generated.output_path);
            let existing = std::fs::read_to_string(&settings_path).ok();
            if let Some(content) =
                resharper::render_settings(&generated.output_path, existing.as_deref())
            {
                writes.push(PlannedWrite {
                    path: settings_path,
                    content,
                });
            }
        }

        let output_path = generated.output_path.clone();
        writes.push(PlannedWrite {
            path: generated.output_path,
            content: generated.content,
        });
        Ok(output_path)
    }

    fn merge_additional(&self, solution_directory: &Path, projects: &mut Vec<ProjectFile>) {
        for extra in &self.settings.additional_included_solutions {
            let path = resolve(solution_directory, &extra.to_string_lossy());
            let Some(entries) = read_additional_solution(&path) else {
                continue;
            };
            for entry in entries {
                if entry.path.is_file() && !projects.contains(&entry) {
                    projects.push(entry);
                }
            }
        }

        for extra in &self.settings.additional_included_project_files {
            let path = resolve(solution_directory, &extra.to_string_lossy());
            if !path.is_file() {
                tracing::warn!(project = %path.display(), "additional project file does not exist");
                continue;
            }
            let entry = ProjectFile::synthetic(path);
            if !projects.contains(&entry) {
                projects.push(entry);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Sync `solution` with the settings stored next to it.
///
/// This is the canonical entry point for `slnsync sync`.
pub fn run(solution: &SolutionFile, dry_run: bool) -> Result<SyncReport, SyncError> {
    Generator::for_solution(solution)?.sync(solution, dry_run)
}

/// The host-generated project file behind a solution entry.
///
/// Entries directly in the solution directory are host files themselves.
/// Otherwise the host file has the same name in the solution directory, or
/// is named after the assembly declared by the entry's assembly definition.
pub fn host_project_path(solution_directory: &Path, project_path: &Path) -> Option<PathBuf> {
    if is_direct_child(solution_directory, project_path) {
        return Some(project_path.to_path_buf());
    }

    let same_name = solution_directory.join(project_path.file_name()?);
    if same_name.is_file() {
        return Some(same_name);
    }

    let declared = ProjectDocument::load(project_path)
        .ok()
        .and_then(|model| model.assembly_definition_path().ok().map(Path::to_path_buf))
        .and_then(|marker| assembly_definition_name(&marker).ok())?;
    let by_assembly = solution_directory.join(format!("{declared}.{PROJECT_EXTENSION}"));
    if by_assembly.is_file() {
        Some(by_assembly)
    } else {
        tracing::debug!(
            project = %project_path.display(),
            expected = %by_assembly.display(),
            "no host project file"
        );
        None
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_solution(solution: &SolutionFile) -> Result<String, SyncError> {
    if !solution.directory().is_dir() {
        return Err(SyncError::SolutionDirectoryMissing {
            path: solution.directory().to_path_buf(),
        });
    }
    std::fs::read_to_string(solution.path()).map_err(|e| io_err(solution.path(), e))
}

fn read_additional_solution(path: &Path) -> Option<Vec<ProjectFile>> {
    if !path.is_file() {
        tracing::warn!(solution = %path.display(), "additional solution does not exist");
        return None;
    }
    let parsed = SolutionFile::new(path)
        .map_err(SyncError::from)
        .and_then(|extra| {
            let text = std::fs::read_to_string(extra.path()).map_err(|e| io_err(extra.path(), e))?;
            Ok(parse_solution(&extra, &text, false)?)
        });
    match parsed {
        Ok(parsed) => Some(parsed.projects),
        Err(e) => {
            tracing::error!(solution = %path.display(), error = %e, "cannot read additional solution");
            None
        }
    }
}

/// Per-file write failures are logged; the run continues.
fn apply_writes(writes: &[PlannedWrite], dry_run: bool) -> Vec<WriteResult> {
    writes
        .iter()
        .filter_map(
            |write| match write_bytes_if_changed(&write.path, write.content.as_bytes(), dry_run) {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::error!(path = %write.path.display(), error = %e, "write failed");
                    None
                }
            },
        )
        .collect()
}

/// With the generator disabled, entries outside the solution directory were
/// put there by an earlier run and are removed again.
fn remove_generated_projects(solution: &SolutionFile, content: &str) -> String {
    if !content.contains(|c| c == '/' || c == '\\') {
        return content.to_owned();
    }
    match parse_solution(solution, content, true) {
        Ok(parsed) => write_to_text(solution, &parsed.projects),
        Err(e) => {
            tracing::error!(
                solution = %solution.path().display(),
                error = %e,
                "cannot clean up solution; keeping host content"
            );
            content.to_owned()
        }
    }
}

fn log_outcomes(solution: &SolutionFile, outcomes: &[ProjectOutcome]) {
    let generated = outcomes
        .iter()
        .filter(|o| matches!(o, ProjectOutcome::Generated { .. }))
        .count();
    let dropped = outcomes
        .iter()
        .filter(|o| matches!(o, ProjectOutcome::Dropped { .. }))
        .count();
    tracing::info!(
        solution = %solution.path().display(),
        projects = outcomes.len(),
        generated,
        dropped,
        "solution synced"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
