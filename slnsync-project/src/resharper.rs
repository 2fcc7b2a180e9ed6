//! ReSharper per-project settings (`<project>.csproj.DotSettings`).
//!
//! Marks every source sub-directory of a project as "not a namespace
//! provider" so namespaces are expected to start at the project root.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use slnsync_core::paths::{has_extension, relative_to};

const HEADER: &str = "<wpf:ResourceDictionary xml:space=\"preserve\" xmlns:x=\"http://schemas.microsoft.com/winfx/2006/xaml\" xmlns:s=\"clr-namespace:System;assembly=mscorlib\" xmlns:ss=\"urn:shemas-jetbrains-com:settings-storage-xaml\" xmlns:wpf=\"http://schemas.microsoft.com/winfx/2006/xaml/presentation\">";
const FOOTER: &str = "</wpf:ResourceDictionary>";

/// `<project>.csproj.DotSettings`
pub fn settings_path(project_path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.DotSettings", project_path.display()))
}

/// Settings content for the project at `project_path`, or `None` when
/// `existing` already mentions every source directory.
pub fn render_settings(project_path: &Path, existing: Option<&str>) -> Option<String> {
    let project_directory = project_path.parent()?;
    let encoded: Vec<String> = source_directories(project_directory)
        .iter()
        .map(|dir| encode_directory(&relative_to(project_directory, dir)))
        .collect();

    if let Some(existing) = existing {
        if encoded.iter().all(|key| existing.contains(key.as_str())) {
            return None;
        }
    }

    let mut lines = vec![HEADER.to_owned()];
    for key in &encoded {
        lines.push(format!(
            "    <s:Boolean x:Key=\"/Default/CodeInspection/NamespaceProvider/NamespaceFoldersToSkip/={key}/@EntryIndexedValue\">False</s:Boolean>"
        ));
    }
    lines.push(FOOTER.to_owned());

    let mut text = lines.join(slnsync_core::NEWLINE);
    text.push_str(slnsync_core::NEWLINE);
    Some(text)
}

/// Lower-cased relative path with `\` as `_005C` and `.` as `_002E`.
pub fn encode_directory(relative: &Path) -> String {
    relative
        .to_string_lossy()
        .to_lowercase()
        .replace('/', "\\")
        .replace('\\', "_005C")
        .replace('.', "_002E")
}

/// Sub-directories (at any depth, pre-order) that contain source code and
/// are not sub-projects themselves. Sub-projects are not descended into.
fn source_directories(directory: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect_source_directories(directory, &mut found);
    found
}

fn collect_source_directories(directory: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(directory) else {
        return;
    };
    let mut subdirectories: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    subdirectories.sort();

    for subdirectory in subdirectories {
        if is_sub_project(&subdirectory) || !contains_source(&subdirectory) {
            continue;
        }
        found.push(subdirectory.clone());
        collect_source_directories(&subdirectory, found);
    }
}

fn is_sub_project(directory: &Path) -> bool {
    std::fs::read_dir(directory)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                let path = e.path();
                path.is_file() && (has_extension(&path, "asmdef") || has_extension(&path, "asmref"))
            })
        })
        .unwrap_or(false)
}

fn contains_source(directory: &Path) -> bool {
    WalkDir::new(directory)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file() && has_extension(e.path(), "cs"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
