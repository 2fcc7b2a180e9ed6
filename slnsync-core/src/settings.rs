//! Per-solution settings, stored as YAML next to the solution file.
//!
//! # Storage layout
//!
//! ```text
//! <solution dir>/
//!   Game.sln
//!   slnsync.yaml   (optional, defaults apply when absent)
//! ```
//!
//! Every function takes the solution directory explicitly; tests point it at
//! a `TempDir`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

/// File name of the settings file inside the solution directory.
pub const SETTINGS_FILE_NAME: &str = "slnsync.yaml";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A name/value pair appended to the generated SDK-style property group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySetting {
    pub name: String,
    pub value: String,
}

impl PropertySetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Generator settings. Missing fields take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch; when off, generated projects are removed from the solution.
    pub enabled: bool,
    /// SDK-style projects when set, legacy-style projects otherwise.
    pub generate_sdk_style_projects: bool,
    pub log_verbose: bool,
    /// Insert `#nullable enable` into newly created source files.
    pub enable_marker_directive: bool,
    /// Delete the `.meta` companion when a source file is deleted.
    pub track_meta_deletion: bool,
    pub generate_resharper_settings: bool,
    pub excluded_analyzer_patterns: Vec<String>,
    pub sdk_excluded_file_patterns: Vec<String>,
    pub sdk_additional_properties: Vec<PropertySetting>,
    /// Extra solutions whose projects are merged in, relative to the solution directory.
    pub additional_included_solutions: Vec<PathBuf>,
    /// Extra project files merged in, relative to the solution directory.
    pub additional_included_project_files: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            generate_sdk_style_projects: true,
            log_verbose: false,
            enable_marker_directive: false,
            track_meta_deletion: false,
            generate_resharper_settings: false,
            excluded_analyzer_patterns: vec!["*/Unity.SourceGenerators.dll".to_owned()],
            sdk_excluded_file_patterns: vec![
                "**/*.meta".to_owned(),
                "**/*.asset".to_owned(),
                "**/*.prefab".to_owned(),
            ],
            sdk_additional_properties: vec![
                PropertySetting::new("EnableNETAnalyzers", "true"),
                PropertySetting::new("AnalysisLevel", "latest"),
                PropertySetting::new("AnalysisMode", "AllEnabledByDefault"),
            ],
            additional_included_solutions: vec![],
            additional_included_project_files: vec![],
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// `<dir>/slnsync.yaml`, pure, no I/O.
pub fn settings_path_at(dir: &Path) -> PathBuf {
    dir.join(SETTINGS_FILE_NAME)
}

/// Load settings from `<dir>/slnsync.yaml`, or defaults if the file is absent.
///
/// Returns `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(dir: &Path) -> Result<Settings, CoreError> {
    let path = settings_path_at(dir);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })
}

/// Atomically save settings to `<dir>/slnsync.yaml`.
///
/// Write flow: serialize → `slnsync.yaml.tmp` sibling → `rename`.
pub fn save_at(dir: &Path, settings: &Settings) -> Result<(), CoreError> {
    let path = settings_path_at(dir);
    let tmp_path = path.with_file_name(format!("{SETTINGS_FILE_NAME}.tmp"));

    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// Write default settings unless a settings file already exists.
///
/// Idempotent: an existing file is loaded and returned unchanged.
pub fn init_at(dir: &Path) -> Result<Settings, CoreError> {
    if settings_path_at(dir).exists() {
        return load_at(dir);
    }
    let settings = Settings::default();
    save_at(dir, &settings)?;
    Ok(settings)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_at(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.enabled);
        assert!(settings.generate_sdk_style_projects);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            settings_path_at(dir.path()),
            "generate_sdk_style_projects: false\ntrack_meta_deletion: true\n",
        )
        .unwrap();
        let settings = load_at(dir.path()).unwrap();
        assert!(!settings.generate_sdk_style_projects);
        assert!(settings.track_meta_deletion);
        assert_eq!(
            settings.excluded_analyzer_patterns,
            vec!["*/Unity.SourceGenerators.dll".to_owned()]
        );
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.additional_included_project_files = vec![PathBuf::from("../Shared/Shared.csproj")];
        settings.sdk_additional_properties.push(PropertySetting::new("LangVersion", "9.0"));
        save_at(dir.path(), &settings).unwrap();
        assert_eq!(load_at(dir.path()).unwrap(), settings);
    }
}
