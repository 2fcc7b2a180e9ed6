use std::path::{Path, PathBuf};
use std::time::Duration;

use slnsync_core::paths::has_extension;

/// Solution re-syncs for the same path closer together than this collapse
/// into one.
pub const DEBOUNCE_WINDOW: Duration = slnsync_sync::DEBOUNCE_WINDOW;

/// Pause between a source file appearing and patching it, so the creating
/// tool can finish its own write first.
pub const CREATE_DELAY: Duration = Duration::from_millis(100);

pub const META_EXTENSION: &str = "meta";
pub const SOURCE_EXTENSION: &str = "cs";

/// `<file>.meta`
pub fn meta_companion(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.{META_EXTENSION}", path.display()))
}

pub fn is_source_file(path: &Path) -> bool {
    has_extension(path, SOURCE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_appends_meta_extension() {
        assert_eq!(
            meta_companion(Path::new("/p/Assets/Player.cs")),
            PathBuf::from("/p/Assets/Player.cs.meta")
        );
    }

    #[test]
    fn extensions_compare_case_insensitively() {
        assert!(is_source_file(Path::new("a/Player.CS")));
        assert!(!is_source_file(Path::new("a/Player.cs.meta")));
    }
}
