//! Solution file parsing.
//!
//! The legacy `.sln` dialect is scanned by hand: only `Project(…) = "name",
//! "path", "id"` headers matter, everything else in the file is ignored. The
//! XML `.slnx` dialect is read with quick-xml.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use slnsync_core::paths::{is_direct_child, resolve};
use slnsync_core::{ProjectFile, SolutionFile, SolutionFormat};

use crate::error::{xml_err, ParseIssue, SolutionError};

const PROJECT_TOKEN: &str = "Project";
const END_PROJECT_TOKEN: &str = "EndProject";

/// Result of parsing one solution.
#[derive(Debug, Clone, Default)]
pub struct ParsedSolution {
    /// Deduplicated entries in output order.
    pub projects: Vec<ProjectFile>,
    /// At least one entry referred to a project listed earlier.
    pub had_duplicates: bool,
    /// Entries that were skipped because they were malformed.
    pub issues: Vec<ParseIssue>,
}

// ---------------------------------------------------------------------------
// Legacy text dialect
// ---------------------------------------------------------------------------

/// Parse legacy solution text.
///
/// Entry paths are resolved against `directory`. With `include_only_local`,
/// entries whose file is not directly inside `directory` are dropped.
pub fn parse(text: &str, directory: &Path, include_only_local: bool) -> ParsedSolution {
    warn_if_missing(directory);

    let mut entries = Vec::new();
    let mut issues = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(PROJECT_TOKEN) {
        let start = cursor + found;
        cursor = start + PROJECT_TOKEN.len();
        if !is_entry_header(text, start) {
            continue;
        }
        match parse_entry(text, start, directory) {
            Ok((project, next)) => {
                entries.push(project);
                cursor = next;
            }
            Err(issue) => {
                tracing::error!(%issue, "skipping malformed solution entry");
                issues.push(issue);
            }
        }
    }

    let (projects, had_duplicates) = deduplicate(entries, directory, include_only_local);
    ParsedSolution {
        projects,
        had_duplicates,
        issues,
    }
}

/// `Project` must stand alone (not part of `EndProject` or `ProjectSection`)
/// and be followed by `(` after optional whitespace.
fn is_entry_header(text: &str, start: usize) -> bool {
    let preceded_by_ident = text[..start]
        .chars()
        .next_back()
        .map(is_ident_char)
        .unwrap_or(false);
    if preceded_by_ident {
        return false;
    }
    text[start + PROJECT_TOKEN.len()..]
        .trim_start()
        .starts_with('(')
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns the entry and the byte offset just past its `EndProject`.
fn parse_entry(
    text: &str,
    start: usize,
    directory: &Path,
) -> Result<(ProjectFile, usize), ParseIssue> {
    let offset = start;
    let end = text[start..]
        .find(END_PROJECT_TOKEN)
        .map(|i| start + i)
        .ok_or(ParseIssue::MissingEndProject { offset })?;

    // Nested sections between the header and EndProject may contain quotes
    // of their own; the fields always sit on the header line.
    let header_end = text[start..end]
        .find('\n')
        .map(|i| start + i)
        .unwrap_or(end);
    let header = &text[start..header_end];

    let first_comma = header.find(',').ok_or(ParseIssue::MissingFields { offset })?;
    let second_comma = header[first_comma + 1..]
        .find(',')
        .map(|i| first_comma + 1 + i)
        .ok_or(ParseIssue::MissingFields { offset })?;

    let raw_path = trim_field(&header[first_comma + 1..second_comma]);
    if raw_path.is_empty() {
        return Err(ParseIssue::EmptyPath { offset });
    }

    let id_field = &header[second_comma + 1..];
    let id_end = id_field
        .rfind('"')
        .ok_or(ParseIssue::MissingIdentifier { offset })?;
    let id = trim_field(&id_field[..id_end]);

    let project = ProjectFile::new(resolve(directory, raw_path), id);
    Ok((project, end + END_PROJECT_TOKEN.len()))
}

fn trim_field(field: &str) -> &str {
    field.trim_matches(|c| c == '"' || c == ' ')
}

// ---------------------------------------------------------------------------
// XML dialect
// ---------------------------------------------------------------------------

/// Parse an XML solution. Entries carry no identifiers, so duplicates are
/// detected by project name only.
pub fn parse_xml(
    text: &str,
    directory: &Path,
    include_only_local: bool,
) -> Result<ParsedSolution, SolutionError> {
    warn_if_missing(directory);

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut issues = Vec::new();
    loop {
        let offset = usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX);
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Project" => {
                match e.try_get_attribute("Path").map_err(xml_err)? {
                    Some(attr) => {
                        let raw = attr.unescape_value().map_err(xml_err)?;
                        entries.push(ProjectFile::new(resolve(directory, &raw), ""));
                    }
                    None => {
                        let issue = ParseIssue::MissingPathAttribute { offset };
                        tracing::error!(%issue, "skipping malformed solution entry");
                        issues.push(issue);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let (projects, had_duplicates) = deduplicate(entries, directory, include_only_local);
    Ok(ParsedSolution {
        projects,
        had_duplicates,
        issues,
    })
}

/// Parse `text` according to the dialect of `solution`.
pub fn parse_solution(
    solution: &SolutionFile,
    text: &str,
    include_only_local: bool,
) -> Result<ParsedSolution, SolutionError> {
    match solution.format() {
        SolutionFormat::Legacy => Ok(parse(text, solution.directory(), include_only_local)),
        SolutionFormat::Xml => parse_xml(text, solution.directory(), include_only_local),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn warn_if_missing(directory: &Path) {
    if !directory.is_dir() {
        tracing::error!(
            directory = %directory.display(),
            "solution directory does not exist"
        );
    }
}

/// A repeated entry that lives directly in the solution directory replaces
/// the earlier one and moves to the end; other repeats are ignored.
fn deduplicate(
    entries: Vec<ProjectFile>,
    directory: &Path,
    include_only_local: bool,
) -> (Vec<ProjectFile>, bool) {
    let mut projects: Vec<ProjectFile> = Vec::with_capacity(entries.len());
    let mut had_duplicates = false;

    for entry in entries {
        let local = is_direct_child(directory, &entry.path);
        if let Some(pos) = projects.iter().position(|p| *p == entry) {
            had_duplicates = true;
            if local {
                projects.remove(pos);
                projects.push(entry);
            }
        } else if !include_only_local || local {
            projects.push(entry);
        }
    }

    if had_duplicates {
        tracing::warn!(
            directory = %directory.display(),
            "solution lists the same project more than once"
        );
    }
    (projects, had_duplicates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ROOT: &str = "/work/Game";

    fn entry(name: &str, path: &str, id: &str) -> String {
        format!(
            "Project(\"{{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}}\") = \"{name}\", \"{path}\", \"{id}\"\nEndProject\n"
        )
    }

    #[test]
    fn reads_path_and_id_from_header() {
        let text = entry("Game", r"Assets\Game.csproj", "{AAA}");
        let parsed = parse(&text, Path::new(ROOT), false);
        assert_eq!(parsed.projects.len(), 1);
        let p = &parsed.projects[0];
        assert_eq!(p.id.0, "{AAA}");
        assert_eq!(p.path, PathBuf::from(ROOT).join("Assets").join("Game.csproj"));
        assert!(!parsed.had_duplicates);
    }

    #[test]
    fn ignores_project_sections_and_global_block() {
        let text = format!(
            "Project(\"{{T}}\") = \"Game\", \"Game.csproj\", \"{{AAA}}\"\n\
             \tProjectSection(ProjectDependencies) = postProject\n\
             \t\t{{BBB}} = {{BBB}}\n\
             \tEndProjectSection\n\
             EndProject\n\
             Global\n\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n\tEndGlobalSection\nEndGlobal\n"
        );
        let parsed = parse(&text, Path::new(ROOT), false);
        assert_eq!(parsed.projects.len(), 1);
        assert_eq!(parsed.projects[0].id.0, "{AAA}");
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn missing_end_project_is_reported_and_skipped() {
        let text = "Project(\"{T}\") = \"Game\", \"Game.csproj\", \"{AAA}\"\n";
        let parsed = parse(text, Path::new(ROOT), false);
        assert!(parsed.projects.is_empty());
        assert_eq!(parsed.issues, vec![ParseIssue::MissingEndProject { offset: 0 }]);
    }

    #[test]
    fn missing_fields_do_not_stop_later_entries() {
        let text = format!(
            "Project(\"{{T}}\") = \"Broken\"\nEndProject\n{}",
            entry("Game", "Game.csproj", "{AAA}")
        );
        let parsed = parse(&text, Path::new(ROOT), false);
        assert_eq!(parsed.projects.len(), 1);
        assert_eq!(parsed.projects[0].name(), "Game");
        assert!(matches!(parsed.issues[0], ParseIssue::MissingFields { .. }));
    }

    #[test]
    fn duplicate_local_entry_replaces_earlier_one() {
        let text = format!(
            "{}{}{}",
            entry("Game", "Assets/Game/Game.csproj", "{AAA}"),
            entry("Core", "Core.csproj", "{CCC}"),
            entry("Game", "Game.csproj", "{AAA}"),
        );
        let parsed = parse(&text, Path::new(ROOT), false);
        assert!(parsed.had_duplicates);
        let paths: Vec<_> = parsed.projects.iter().map(|p| p.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from(ROOT).join("Core.csproj"),
                PathBuf::from(ROOT).join("Game.csproj"),
            ]
        );
    }

    #[test]
    fn duplicate_non_local_entry_keeps_the_first() {
        let text = format!(
            "{}{}",
            entry("Game", "Game.csproj", "{AAA}"),
            entry("Game", "Assets/Game.csproj", "{AAA}"),
        );
        let parsed = parse(&text, Path::new(ROOT), false);
        assert!(parsed.had_duplicates);
        assert_eq!(parsed.projects.len(), 1);
        assert_eq!(parsed.projects[0].path, PathBuf::from(ROOT).join("Game.csproj"));
    }

    #[test]
    fn only_local_drops_nested_entries() {
        let text = format!(
            "{}{}",
            entry("Game", "Game.csproj", "{AAA}"),
            entry("Tools", "Assets/Tools/Tools.csproj", "{BBB}"),
        );
        let parsed = parse(&text, Path::new(ROOT), true);
        assert_eq!(parsed.projects.len(), 1);
        assert_eq!(parsed.projects[0].name(), "Game");
    }

    #[test]
    fn xml_dialect_reads_nested_project_paths() {
        let text = "<Solution>\r\n  <Folder Name=\"/Tools/\">\r\n    <Project Path=\"Assets/Tools/Tools.csproj\" />\r\n  </Folder>\r\n  <Project Path=\"Game.csproj\" />\r\n</Solution>\r\n";
        let parsed = parse_xml(text, Path::new(ROOT), false).unwrap();
        let names: Vec<_> = parsed.projects.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Tools", "Game"]);
        assert!(parsed.projects.iter().all(|p| p.id.is_empty()));
    }

    #[test]
    fn xml_dialect_reports_missing_path() {
        let parsed = parse_xml("<Solution><Project /></Solution>", Path::new(ROOT), false).unwrap();
        assert!(parsed.projects.is_empty());
        assert!(matches!(parsed.issues[0], ParseIssue::MissingPathAttribute { .. }));
    }

    #[test]
    fn xml_dialect_rejects_malformed_documents() {
        assert!(parse_xml("<Solution><Project Path=\"a\"></Solution>", Path::new(ROOT), false).is_err());
    }
}
