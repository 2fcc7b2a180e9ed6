//! Solution file rendering.
//!
//! Output is deterministic: the same directory and project list always
//! produce the same bytes.

use std::io;
use std::path::Path;

use quick_xml::escape::escape;

use slnsync_core::paths::relative_to;
use slnsync_core::{ProjectFile, SolutionFile, SolutionFormat, NEWLINE};

/// Project type GUID of a C# project.
pub const CSHARP_PROJECT_TYPE: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";

const LEGACY_HEADER: [&str; 4] = [
    "Microsoft Visual Studio Solution File, Format Version 12.00",
    "# Visual Studio Version 17",
    "VisualStudioVersion = 17.0.32014.148",
    "MinimumVisualStudioVersion = 10.0.40219.1",
];

const CONFIGURATIONS: [&str; 2] = ["Debug|Any CPU", "Release|Any CPU"];

/// The XML dialect always uses CRLF.
const XML_NEWLINE: &str = "\r\n";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render `projects` in the dialect of `solution`.
pub fn write_to_text(solution: &SolutionFile, projects: &[ProjectFile]) -> String {
    match solution.format() {
        SolutionFormat::Legacy => legacy_text(solution.directory(), projects),
        SolutionFormat::Xml => xml_text(solution.directory(), projects),
    }
}

/// Stream the rendered solution into `writer`.
pub fn write_to<W: io::Write>(
    writer: &mut W,
    solution: &SolutionFile,
    projects: &[ProjectFile],
) -> io::Result<()> {
    writer.write_all(write_to_text(solution, projects).as_bytes())
}

// ---------------------------------------------------------------------------
// Legacy dialect
// ---------------------------------------------------------------------------

/// Legacy `.sln` text with tab indentation and platform line endings.
pub fn legacy_text(directory: &Path, projects: &[ProjectFile]) -> String {
    let mut lines: Vec<String> = LEGACY_HEADER.iter().map(|l| (*l).to_owned()).collect();

    for project in projects {
        lines.push(format!(
            "Project(\"{CSHARP_PROJECT_TYPE}\") = \"{}\", \"{}\", \"{}\"",
            project.name(),
            relative_to(directory, &project.path).display(),
            project.id
        ));
        lines.push("EndProject".to_owned());
    }

    lines.push("Global".to_owned());

    lines.push("\tGlobalSection(SolutionConfigurationPlatforms) = preSolution".to_owned());
    for config in CONFIGURATIONS {
        lines.push(format!("\t\t{config} = {config}"));
    }
    lines.push("\tEndGlobalSection".to_owned());

    lines.push("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution".to_owned());
    for project in projects {
        for config in CONFIGURATIONS {
            lines.push(format!("\t\t{}.{config}.ActiveCfg = {config}", project.id));
            lines.push(format!("\t\t{}.{config}.Build.0 = {config}", project.id));
        }
    }
    lines.push("\tEndGlobalSection".to_owned());

    lines.push("\tGlobalSection(SolutionProperties) = preSolution".to_owned());
    lines.push("\t\tHideSolutionNode = FALSE".to_owned());
    lines.push("\tEndGlobalSection".to_owned());

    lines.push("EndGlobal".to_owned());

    let mut text = lines.join(NEWLINE);
    text.push_str(NEWLINE);
    text
}

// ---------------------------------------------------------------------------
// XML dialect
// ---------------------------------------------------------------------------

/// XML `.slnx` text: two-space indent, CRLF, trailing CRLF.
pub fn xml_text(directory: &Path, projects: &[ProjectFile]) -> String {
    if projects.is_empty() {
        return format!("<Solution />{XML_NEWLINE}");
    }

    let mut text = format!("<Solution>{XML_NEWLINE}");
    for project in projects {
        let rel = relative_to(directory, &project.path)
            .to_string_lossy()
            .into_owned();
        text.push_str(&format!(
            "  <Project Path=\"{}\" />{XML_NEWLINE}",
            escape(rel.as_str())
        ));
    }
    text.push_str("</Solution>");
    text.push_str(XML_NEWLINE);
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
