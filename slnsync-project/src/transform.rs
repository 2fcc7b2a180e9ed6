//! Project generation strategies and the helpers they share.
//!
//! A transformation takes the host-generated project, relocates it next to
//! its assembly definition and rewrites every path so the project still
//! builds from there.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use slnsync_core::paths::{ends_with_ignore_case, relative_to};
use slnsync_core::{PatternSet, Settings};

use crate::document::{ProjectDocument, ASSEMBLY_DEFINITION_EXTENSION};
use crate::error::ProjectError;
use crate::xml::{Document, Element};
use crate::{legacy, sdk};

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Output dialect of generated projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStyle {
    /// Keep the host's verbose project layout, with paths rewritten.
    Legacy,
    /// Rebuild the project as a minimal SDK-style project.
    Sdk,
}

impl ProjectStyle {
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.generate_sdk_style_projects {
            ProjectStyle::Sdk
        } else {
            ProjectStyle::Legacy
        }
    }

    /// Produce the output document for `model`, which will be written into
    /// `output_directory`.
    pub fn transform(
        self,
        model: ProjectDocument,
        output_directory: &Path,
        solution_directory: &Path,
        settings: &Settings,
        resolver: &mut ReferenceResolver,
    ) -> Result<Document, ProjectError> {
        match self {
            ProjectStyle::Legacy => {
                legacy::transform(model, output_directory, solution_directory, resolver)
            }
            ProjectStyle::Sdk => {
                sdk::transform(model, output_directory, solution_directory, settings, resolver)
            }
        }
    }

    /// Legacy projects keep their XML declaration; SDK-style ones omit it.
    pub fn writes_declaration(self) -> bool {
        matches!(self, ProjectStyle::Legacy)
    }
}

/// A transformed project, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProject {
    pub name: String,
    pub output_path: PathBuf,
    pub content: String,
}

/// Transform a host-generated project with the given strategy.
///
/// The host writes its projects into the solution directory, so the source
/// project's directory doubles as the solution directory.
pub fn generate_project(
    style: ProjectStyle,
    mut model: ProjectDocument,
    settings: &Settings,
    resolver: &mut ReferenceResolver,
) -> Result<GeneratedProject, ProjectError> {
    let output_path = model.output_path()?;
    let output_directory = output_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let solution_directory = model.directory().to_path_buf();
    let name = model.name().to_owned();

    remove_excluded_analyzers(&mut model, &PatternSet::new(&settings.excluded_analyzer_patterns));

    let document = style.transform(model, &output_directory, &solution_directory, settings, resolver)?;
    let content = document
        .to_xml_string(style.writes_declaration())
        .map_err(|e| e.at(&output_path))?;

    tracing::debug!(
        project = %name,
        output = %output_path.display(),
        ?style,
        "generated project"
    );
    Ok(GeneratedProject {
        name,
        output_path,
        content,
    })
}

// ---------------------------------------------------------------------------
// Reference resolution
// ---------------------------------------------------------------------------

/// Maps referenced project files to the location of their generated
/// counterpart. Each referenced file is read at most once per resolver.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    resolved: HashMap<PathBuf, PathBuf>,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// New location of the project at `project_path`.
    ///
    /// Package-cache projects stay where they are. A reference that cannot be
    /// read keeps its original path.
    pub fn determine_new_project_file_path(&mut self, project_path: &Path) -> PathBuf {
        if let Some(known) = self.resolved.get(project_path) {
            return known.clone();
        }
        let resolved = match new_project_file_path(project_path) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(
                    reference = %project_path.display(),
                    error = %e,
                    "keeping unresolved project reference"
                );
                project_path.to_path_buf()
            }
        };
        self.resolved
            .insert(project_path.to_path_buf(), resolved.clone());
        resolved
    }
}

fn new_project_file_path(project_path: &Path) -> Result<PathBuf, ProjectError> {
    let model = ProjectDocument::load(project_path)?;
    if model.is_from_package_cache()? {
        Ok(project_path.to_path_buf())
    } else {
        model.output_path()
    }
}

// ---------------------------------------------------------------------------
// Shared rewrites
// ---------------------------------------------------------------------------

/// Drop `Analyzer` items whose path matches one of `patterns`.
pub fn remove_excluded_analyzers(model: &mut ProjectDocument, patterns: &PatternSet) {
    if patterns.is_empty() {
        return;
    }
    let directory = model.directory().to_path_buf();
    let root = model.root_mut();
    root.remove_descendants(&mut |e: &Element| {
        if !e.is("Analyzer") {
            return false;
        }
        let excluded = patterns.matches_any(e.attribute("Include"));
        if excluded {
            tracing::debug!(
                analyzer = e.attribute("Include").unwrap_or_default(),
                project = %directory.display(),
                "removing excluded analyzer"
            );
        }
        excluded
    });
}

/// Rewrite every `HintPath` below `element` to an absolute path.
pub(crate) fn absolutize_hint_paths(element: &mut Element, project_directory: &Path) {
    element.for_each_descendant_mut("HintPath", &mut |hint: &mut Element| {
        let absolute = slnsync_core::paths::resolve(project_directory, &hint.text());
        hint.set_text(absolute.display().to_string());
    });
}

/// Rewrite a `ProjectReference` to point at the referenced project's new
/// location, relative to `output_directory`.
pub(crate) fn rewrite_project_reference(
    reference: &mut Element,
    project_directory: &Path,
    output_directory: &Path,
    resolver: &mut ReferenceResolver,
) {
    let Some(include) = reference.attribute("Include") else {
        return;
    };
    let referenced = slnsync_core::paths::resolve(project_directory, include);
    let new_path = resolver.determine_new_project_file_path(&referenced);
    reference.set_attribute("Include", path_string(&relative_to(output_directory, &new_path)));
}

/// Directories below `output_directory` that hold their own assembly
/// definition, relative to it and sorted.
pub fn sub_project_directories(output_directory: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(output_directory)
        .min_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            ends_with_ignore_case(
                &entry.file_name().to_string_lossy(),
                ASSEMBLY_DEFINITION_EXTENSION,
            )
        })
        .filter_map(|entry| entry.path().parent().map(|p| relative_to(output_directory, p)))
        .filter(|rel| !rel.as_os_str().is_empty() && rel.as_os_str() != ".")
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

pub(crate) fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// `<solution>/<segments…>/<name>` as a string.
pub(crate) fn solution_path(solution_directory: &Path, segments: &[&str], name: &str) -> String {
    let mut path = solution_directory.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path.push(name);
    path_string(&path)
}

pub(crate) fn property(name: &str, value: impl Into<String>) -> Element {
    Element::new(name).with_text(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
