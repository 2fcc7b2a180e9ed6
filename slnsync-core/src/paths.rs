//! Lexical path helpers shared by the parser, the transformers and the patcher.
//!
//! Project and solution files written on Windows use `\` as separator. All
//! raw path strings read from those files go through [`resolve`], which
//! accepts both separators on every platform.

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Drop `.` components and fold `..` into their parent without touching the
/// file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Rewrite `/` and `\` to the platform separator.
pub fn to_platform_separators(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}

/// Resolve a path string taken from a solution or project file against
/// `base`. Absolute inputs are only normalized.
pub fn resolve(base: &Path, raw: &str) -> PathBuf {
    let candidate = PathBuf::from(to_platform_separators(raw.trim()));
    if candidate.is_absolute() {
        normalize(&candidate)
    } else {
        normalize(&base.join(candidate))
    }
}

/// Path of `target` relative to the directory `base`. Falls back to `target`
/// when no relative form exists (different prefixes on Windows).
pub fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base = normalize(base);
    let target = normalize(target);
    match pathdiff::diff_paths(&target, &base) {
        Some(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Some(rel) => rel,
        None => target,
    }
}

/// `true` when `file` sits directly inside `dir` (not in a sub-directory).
pub fn is_direct_child(dir: &Path, file: &Path) -> bool {
    file.parent()
        .map(|parent| normalize(parent) == normalize(dir))
        .unwrap_or(false)
}

/// `true` when `path` lies inside the host's read-only package cache
/// (`…/Library/PackageCache/…`, compared case-insensitively).
pub fn is_package_cache_path(path: &Path) -> bool {
    let needle = format!("{MAIN_SEPARATOR}library{MAIN_SEPARATOR}packagecache{MAIN_SEPARATOR}");
    path.to_string_lossy().to_lowercase().contains(&needle)
}

/// Case-insensitive extension check (`ext` without the leading dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Case-insensitive suffix check on a raw path string taken from a file.
pub fn ends_with_ignore_case(raw: &str, suffix: &str) -> bool {
    raw.len() >= suffix.len()
        && raw
            .get(raw.len() - suffix.len()..)
            .map(|tail| tail.eq_ignore_ascii_case(suffix))
            .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_parent_and_current_components() {
        let path = Path::new("/a/b/./c/../d");
        assert_eq!(normalize(path), PathBuf::from("/a/b/d"));
    }

    #[test]
    fn normalize_keeps_leading_parent_of_relative_path() {
        assert_eq!(normalize(Path::new("../x/../y")), PathBuf::from("../y"));
    }

    #[test]
    fn resolve_accepts_backslash_separators() {
        let resolved = resolve(Path::new("/proj"), r"Assets\Scripts\Game.csproj");
        assert_eq!(
            resolved,
            Path::new("/proj").join("Assets").join("Scripts").join("Game.csproj")
        );
    }

    #[test]
    #[cfg(unix)]
    fn resolve_keeps_absolute_inputs() {
        assert_eq!(
            resolve(Path::new("/proj"), "/other/./lib.dll"),
            PathBuf::from("/other/lib.dll")
        );
    }

    #[test]
    #[cfg(unix)]
    fn relative_to_walks_up_and_down() {
        let rel = relative_to(Path::new("/proj/Assets/Game"), Path::new("/proj/Assets/Core/Core.csproj"));
        assert_eq!(rel, PathBuf::from("../Core/Core.csproj"));
    }

    #[test]
    fn relative_to_same_directory_is_dot() {
        assert_eq!(relative_to(Path::new("/proj"), Path::new("/proj")), PathBuf::from("."));
    }

    #[test]
    fn direct_child_detection() {
        assert!(is_direct_child(Path::new("/proj"), Path::new("/proj/Game.csproj")));
        assert!(!is_direct_child(Path::new("/proj"), Path::new("/proj/Assets/Game.csproj")));
    }

    #[test]
    #[cfg(unix)]
    fn package_cache_detection_ignores_case() {
        assert!(is_package_cache_path(Path::new(
            "/proj/library/PACKAGECACHE/com.unity.x/x.asmdef"
        )));
        assert!(!is_package_cache_path(Path::new("/proj/Assets/x.asmdef")));
    }

    #[test]
    fn suffix_check_ignores_case() {
        assert!(ends_with_ignore_case(r"Assets\Game.ASMDEF", ".asmdef"));
        assert!(!ends_with_ignore_case("def", ".asmdef"));
    }
}
