//! Domain types shared by every slnsync crate.
//!
//! All path fields use `PathBuf` and are absolute and lexically normalized.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{io_err, CoreError};
use crate::paths::{self, has_extension};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A solution-scoped project identifier, usually a braced GUID.
///
/// Empty for solution dialects that do not carry identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Deterministic GUID-shaped identifier derived from a path, used for
    /// projects merged in from outside the solution.
    pub fn synthetic(path: &Path) -> Self {
        let digest = Sha256::digest(path.to_string_lossy().as_bytes());
        let hex = hex::encode_upper(&digest[..16]);
        Self(format!(
            "{{{}-{}-{}-{}-{}}}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// ProjectFile
// ---------------------------------------------------------------------------

/// One project entry of a solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub id: ProjectId,
}

impl ProjectFile {
    pub fn new(path: impl Into<PathBuf>, id: impl Into<ProjectId>) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
        }
    }

    /// Entry for a project that is not listed in any solution.
    pub fn synthetic(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = ProjectId::synthetic(&path);
        Self { path, id }
    }

    /// File name without extension.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Same identifier, different file.
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id: self.id.clone(),
        }
    }
}

/// Two entries denote the same project when their identifiers match (both
/// non-empty) or their derived names match.
impl PartialEq for ProjectFile {
    fn eq(&self, other: &Self) -> bool {
        (!self.id.is_empty() && self.id == other.id) || self.name() == other.name()
    }
}

impl fmt::Display for ProjectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.path.display())
    }
}

// ---------------------------------------------------------------------------
// SolutionFile
// ---------------------------------------------------------------------------

/// Solution file dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionFormat {
    /// Line-oriented `.sln` text.
    Legacy,
    /// XML `.slnx`.
    Xml,
}

impl SolutionFormat {
    pub fn from_path(path: &Path) -> Self {
        if has_extension(path, "slnx") {
            SolutionFormat::Xml
        } else {
            SolutionFormat::Legacy
        }
    }
}

impl fmt::Display for SolutionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionFormat::Legacy => write!(f, "sln"),
            SolutionFormat::Xml => write!(f, "slnx"),
        }
    }
}

/// A solution file location. `directory` is always the parent of `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionFile {
    directory: PathBuf,
    path: PathBuf,
    format: SolutionFormat,
}

impl SolutionFile {
    /// Relative paths are made absolute against the current directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let raw = path.as_ref();
        let absolute = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|e| io_err(raw, e))?;
            cwd.join(raw)
        };
        let path = paths::normalize(&absolute);
        let directory = match (path.parent(), path.file_name()) {
            (Some(parent), Some(_)) => parent.to_path_buf(),
            _ => return Err(CoreError::InvalidSolutionPath { path }),
        };
        let format = SolutionFormat::from_path(&path);
        Ok(Self {
            directory,
            path,
            format,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SolutionFormat {
        self.format
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_name_is_file_stem() {
        let p = ProjectFile::new("/proj/Assets/Game.csproj", "{1}");
        assert_eq!(p.name(), "Game");
    }

    #[test]
    fn equality_by_id_or_name() {
        let a = ProjectFile::new("/proj/Game.csproj", "{A}");
        let b = ProjectFile::new("/proj/Assets/Game.csproj", "{B}");
        let c = ProjectFile::new("/proj/Other.csproj", "{A}");
        let d = ProjectFile::new("/proj/Other.csproj", "{D}");
        assert_eq!(a, b, "same name");
        assert_eq!(a, c, "same id");
        assert_ne!(a, d);
    }

    #[test]
    fn empty_ids_never_match_each_other() {
        let a = ProjectFile::new("/proj/A.csproj", "");
        let b = ProjectFile::new("/proj/B.csproj", "");
        assert_ne!(a, b);
    }

    #[test]
    fn synthetic_id_is_stable_and_guid_shaped() {
        let first = ProjectId::synthetic(Path::new("/proj/Extra/Extra.csproj"));
        let second = ProjectId::synthetic(Path::new("/proj/Extra/Extra.csproj"));
        assert_eq!(first, second);
        assert_eq!(first.0.len(), 38);
        assert!(first.0.starts_with('{') && first.0.ends_with('}'));
        assert_eq!(first.0.matches('-').count(), 4);
    }

    #[test]
    fn solution_format_from_extension_is_case_insensitive() {
        assert_eq!(SolutionFormat::from_path(Path::new("a.SLNX")), SolutionFormat::Xml);
        assert_eq!(SolutionFormat::from_path(Path::new("a.sln")), SolutionFormat::Legacy);
    }

    #[test]
    #[cfg(unix)]
    fn solution_directory_is_parent() {
        let sln = SolutionFile::new("/proj/./Game.sln").unwrap();
        assert_eq!(sln.directory(), Path::new("/proj"));
        assert_eq!(sln.path(), Path::new("/proj/Game.sln"));
    }
}
