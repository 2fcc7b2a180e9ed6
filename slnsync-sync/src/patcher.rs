//! Retrofits `#nullable enable` as the first line of C# source files.
//!
//! Files are treated as bytes: a UTF-8 BOM is kept in front of the marker and
//! the file's own line ending is reused.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use slnsync_core::{SolutionFile, NEWLINE};
use slnsync_project::ProjectDocument;
use slnsync_solution::parse_solution;

use crate::error::{io_err, SyncError};
use crate::pipeline::host_project_path;
use crate::writer::{write_bytes_if_changed, WriteResult};

/// The directive placed at the top of every source file.
pub const MARKER: &[u8] = b"#nullable enable";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ---------------------------------------------------------------------------
// Pure rewrite
// ---------------------------------------------------------------------------

/// `content` with the marker inserted, or `None` when it already starts with
/// it. `default_newline` is used when `content` has no line break.
pub fn insert_marker(content: &[u8], default_newline: &[u8]) -> Option<Vec<u8>> {
    let (bom, body) = match content.strip_prefix(UTF8_BOM) {
        Some(rest) => (UTF8_BOM, rest),
        None => (&[][..], content),
    };
    if body.starts_with(MARKER) {
        return None;
    }

    let newline = detect_newline(body).unwrap_or(default_newline);
    let starts_with_newline = body.starts_with(newline);
    let skip_second_newline = body.is_empty()
        || (starts_with_newline
            && (body[newline.len()..].starts_with(newline) || body.len() == newline.len()));

    let mut patched = Vec::with_capacity(content.len() + MARKER.len() + 2 * newline.len());
    patched.extend_from_slice(bom);
    patched.extend_from_slice(MARKER);
    if !starts_with_newline {
        patched.extend_from_slice(newline);
    }
    if !skip_second_newline {
        patched.extend_from_slice(newline);
    }
    patched.extend_from_slice(body);
    Some(patched)
}

/// Line ending of the first line: CRLF when the first `\n` follows a `\r`.
fn detect_newline(body: &[u8]) -> Option<&'static [u8]> {
    let index = body.iter().position(|b| *b == b'\n')?;
    if index > 0 && body[index - 1] == b'\r' {
        Some(b"\r\n")
    } else {
        Some(b"\n")
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Ensure the file at `path` starts with the marker.
///
/// Only the leading bytes are read when the file is already marked.
pub fn ensure_marker_line(path: &Path) -> Result<WriteResult, SyncError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut prefix = Vec::with_capacity(UTF8_BOM.len() + MARKER.len());
    (&mut file)
        .take((UTF8_BOM.len() + MARKER.len()) as u64)
        .read_to_end(&mut prefix)
        .map_err(|e| io_err(path, e))?;

    let body = prefix.strip_prefix(UTF8_BOM).unwrap_or(&prefix);
    if body.starts_with(MARKER) {
        tracing::debug!(path = %path.display(), "marker already present");
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }

    let mut content = prefix;
    file.read_to_end(&mut content)
        .map_err(|e| io_err(path, e))?;
    drop(file);

    match insert_marker(&content, NEWLINE.as_bytes()) {
        Some(patched) => {
            let result = write_bytes_if_changed(path, &patched, false)?;
            tracing::debug!(path = %path.display(), "added marker line");
            Ok(result)
        }
        None => Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        }),
    }
}

/// Counts of a batch patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchSummary {
    pub patched: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl PatchSummary {
    fn merge(&mut self, other: PatchSummary) {
        self.patched += other.patched;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }
}

/// [`ensure_marker_line`] for every file; failures are logged and counted.
pub fn ensure_marker_lines<I, P>(paths: I) -> PatchSummary
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut summary = PatchSummary::default();
    for path in paths {
        let path = path.as_ref();
        match ensure_marker_line(path) {
            Ok(WriteResult::Unchanged { .. }) => summary.unchanged += 1,
            Ok(_) => summary.patched += 1,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to add marker line");
                summary.failed += 1;
            }
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Whole solution
// ---------------------------------------------------------------------------

/// Add the marker to every non-package source file of every project listed
/// in `solution`.
///
/// Sources are read from the host-generated project files, which still list
/// each file explicitly.
pub fn patch_solution_sources(solution: &SolutionFile) -> Result<PatchSummary, SyncError> {
    let text = std::fs::read_to_string(solution.path()).map_err(|e| io_err(solution.path(), e))?;
    let parsed = parse_solution(solution, &text, false)?;

    let mut summary = PatchSummary::default();
    for project in &parsed.projects {
        let Some(host) = host_project_path(solution.directory(), &project.path) else {
            tracing::warn!(
                project = %project.path.display(),
                "no host project file found; skipping its sources"
            );
            continue;
        };
        let sources = match ProjectDocument::load(&host) {
            Ok(document) => document.source_files(),
            Err(e) => {
                tracing::error!(project = %host.display(), error = %e, "cannot read project");
                summary.failed += 1;
                continue;
            }
        };
        summary.merge(ensure_marker_lines(sources.iter().map(PathBuf::as_path)));
    }

    tracing::info!(
        patched = summary.patched,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "patched solution sources"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
