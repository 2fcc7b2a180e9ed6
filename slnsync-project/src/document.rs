//! In-memory model of one host-generated project file.
//!
//! The host generates one project per assembly definition (`.asmdef`) and
//! lists that file as a `None` item. Everything a transformer needs to know
//! about where the project really lives is derived from that marker.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use slnsync_core::paths::{self, ends_with_ignore_case, is_package_cache_path};

use crate::error::{format_err, io_err, ProjectError};
use crate::xml::{Document, Element};

/// Extension of the marker file that anchors a project's source root.
pub const ASSEMBLY_DEFINITION_EXTENSION: &str = ".asmdef";
/// Extension of generated project files.
pub const PROJECT_EXTENSION: &str = "csproj";

#[derive(Debug, Clone)]
pub struct ProjectDocument {
    document: Document,
    file_path: PathBuf,
    directory: PathBuf,
    name: String,
    assembly_definition: OnceCell<PathBuf>,
}

impl ProjectDocument {
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse project XML that was read from `file_path`.
    pub fn parse(text: &str, file_path: &Path) -> Result<Self, ProjectError> {
        let file_path = paths::normalize(file_path);
        let document = Document::parse(text).map_err(|e| e.at(&file_path))?;
        if !document.root.is("Project") {
            return Err(format_err(format!(
                "root element is <{}>, expected <Project>",
                document.root.name
            ))
            .at(&file_path));
        }

        let directory = file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            document,
            file_path,
            directory,
            name,
            assembly_definition: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Directory containing the project file.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Default XML namespace of the `Project` element, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.document.root.attribute("xmlns")
    }

    pub fn root(&self) -> &Element {
        &self.document.root
    }

    /// Item rewrites must not touch the `.asmdef` marker, which is cached.
    pub(crate) fn root_mut(&mut self) -> &mut Element {
        &mut self.document.root
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Resolve an item path written in this project against its directory.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        paths::resolve(&self.directory, raw)
    }

    /// Absolute paths of the project's `Compile` items.
    ///
    /// Projects whose first source file lies in the package cache are
    /// read-only, so they report no sources at all.
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for item in self.document.root.descendants("Compile") {
            let Some(include) = item.attribute("Include") else {
                continue;
            };
            let path = self.resolve(include);
            if files.is_empty() && is_package_cache_path(&path) {
                return Vec::new();
            }
            files.push(path);
        }
        files
    }

    /// The single `.asmdef` referenced by a `None` item.
    pub fn assembly_definition_path(&self) -> Result<&Path, ProjectError> {
        if let Some(path) = self.assembly_definition.get() {
            return Ok(path);
        }
        let markers: Vec<&str> = self
            .document
            .root
            .descendants("None")
            .into_iter()
            .filter_map(|e| e.attribute("Include"))
            .filter(|include| ends_with_ignore_case(include, ASSEMBLY_DEFINITION_EXTENSION))
            .collect();
        if markers.len() != 1 {
            return Err(ProjectError::ReferenceResolution {
                path: self.file_path.clone(),
                found: markers.len(),
            });
        }
        let path = self.resolve(markers[0]);
        Ok(self.assembly_definition.get_or_init(|| path))
    }

    /// Directory holding the assembly definition; the project's source root.
    pub fn root_directory(&self) -> Result<PathBuf, ProjectError> {
        let marker = self.assembly_definition_path()?;
        Ok(marker.parent().map(Path::to_path_buf).unwrap_or_default())
    }

    /// Where the transformed project is written: next to the assembly
    /// definition, named after it.
    pub fn output_path(&self) -> Result<PathBuf, ProjectError> {
        Ok(self
            .assembly_definition_path()?
            .with_extension(PROJECT_EXTENSION))
    }

    pub fn is_from_package_cache(&self) -> Result<bool, ProjectError> {
        Ok(is_package_cache_path(self.assembly_definition_path()?))
    }
}

// ---------------------------------------------------------------------------
// Assembly definition files
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AssemblyDefinition {
    name: String,
}

/// The assembly name declared inside an `.asmdef` file.
pub fn assembly_definition_name(path: &Path) -> Result<String, ProjectError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let definition: AssemblyDefinition =
        serde_json::from_str(&text).map_err(|source| ProjectError::AssemblyDefinition {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(definition.name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(items: &str) -> String {
        format!(
            "<Project xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\"><ItemGroup>{items}</ItemGroup></Project>"
        )
    }

    #[test]
    fn name_and_directory_come_from_file_path() {
        let doc = ProjectDocument::parse(&project(""), Path::new("/work/Game/Game.Core.csproj")).unwrap();
        assert_eq!(doc.name(), "Game.Core");
        assert_eq!(doc.directory(), Path::new("/work/Game"));
        assert_eq!(
            doc.namespace(),
            Some("http://schemas.microsoft.com/developer/msbuild/2003")
        );
    }

    #[test]
    fn wrong_root_is_a_format_error() {
        let err = ProjectDocument::parse("<Solution />", Path::new("/work/Game/Game.csproj")).unwrap_err();
        assert!(matches!(err, ProjectError::Format { .. }), "got: {err}");
    }

    #[test]
    fn assembly_definition_is_resolved_against_project_directory() {
        let doc = ProjectDocument::parse(
            &project(r#"<None Include="Assets\Game\Game.ASMDEF" /><None Include="Assets\readme.txt" />"#),
            Path::new("/work/Game/Game.csproj"),
        )
        .unwrap();
        let expected = Path::new("/work/Game").join("Assets").join("Game").join("Game.ASMDEF");
        assert_eq!(doc.assembly_definition_path().unwrap(), expected.as_path());
        assert_eq!(doc.output_path().unwrap(), expected.with_extension("csproj"));
        assert_eq!(doc.root_directory().unwrap(), Path::new("/work/Game").join("Assets").join("Game"));
        assert!(!doc.is_from_package_cache().unwrap());
    }

    #[test]
    fn zero_or_many_markers_fail() {
        let none = ProjectDocument::parse(&project(""), Path::new("/w/A.csproj")).unwrap();
        assert!(matches!(
            none.assembly_definition_path(),
            Err(ProjectError::ReferenceResolution { found: 0, .. })
        ));

        let two = ProjectDocument::parse(
            &project(r#"<None Include="a/A.asmdef" /><None Include="b/B.asmdef" />"#),
            Path::new("/w/A.csproj"),
        )
        .unwrap();
        assert!(matches!(
            two.assembly_definition_path(),
            Err(ProjectError::ReferenceResolution { found: 2, .. })
        ));
    }

    #[test]
    fn package_cache_projects_report_no_sources() {
        let doc = ProjectDocument::parse(
            &project(
                r#"<Compile Include="Library\PackageCache\com.x\A.cs" /><Compile Include="Assets\B.cs" />"#,
            ),
            Path::new("/work/Game/X.csproj"),
        )
        .unwrap();
        assert!(doc.source_files().is_empty());
    }

    #[test]
    fn source_files_are_absolute() {
        let doc = ProjectDocument::parse(
            &project(r#"<Compile Include="Assets\A.cs" /><Compile Include="Assets\B.cs" />"#),
            Path::new("/work/Game/X.csproj"),
        )
        .unwrap();
        let files = doc.source_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1], Path::new("/work/Game").join("Assets").join("B.cs"));
    }

    #[test]
    fn reads_assembly_name_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Game.asmdef");
        std::fs::write(&path, r#"{ "name": "Game.Runtime", "references": [] }"#).unwrap();
        assert_eq!(assembly_definition_name(&path).unwrap(), "Game.Runtime");
    }
}
