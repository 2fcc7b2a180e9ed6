//! Hash-gated atomic writer.
//!
//! ## `write_if_changed` protocol
//!
//! 1. Render into `<path>.slnsync.tmp` (parent directories created).
//! 2. No target yet → rename the temp file into place.
//! 3. SHA-256 both files.
//! 4. Identical → delete the temp file, target mtime untouched.
//! 5. Different → rename over the target (atomic on POSIX).
//!
//! A failed render or rename deletes the temp file and leaves the target
//! as it was.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

/// Suffix of the sibling file content is rendered into.
pub const TMP_SUFFIX: &str = ".slnsync.tmp";

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// What [`write_if_changed`] did with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// New or different content landed on disk.
    Written { path: PathBuf },
    /// Disk already held the rendered bytes; nothing was touched.
    Unchanged { path: PathBuf },
    /// Dry run found a difference.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    /// `true` unless the file was already up to date.
    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

/// `<path>.slnsync.tmp`
pub fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()))
}

// ---------------------------------------------------------------------------
// write_if_changed
// ---------------------------------------------------------------------------

/// Write whatever `render` produces to `path`, unless the file already holds
/// exactly those bytes.
pub fn write_if_changed<F>(path: &Path, render: F, dry_run: bool) -> Result<WriteResult, SyncError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    if dry_run {
        let mut buffer = Vec::new();
        render(&mut buffer).map_err(|e| io_err(path, e))?;
        return compare_in_memory(path, &buffer);
    }
    write_with_tmp(path, render, &tmp_path(path))
}

/// [`write_if_changed`] for content that is already in memory.
pub fn write_bytes_if_changed(
    path: &Path,
    bytes: &[u8],
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    write_if_changed(path, |out| out.write_all(bytes), dry_run)
}

fn compare_in_memory(path: &Path, rendered: &[u8]) -> Result<WriteResult, SyncError> {
    let unchanged = match file_digest(path) {
        Ok(existing) => existing == hex::encode(Sha256::digest(rendered)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(io_err(path, e)),
    };
    if unchanged {
        tracing::debug!(path = %path.display(), "unchanged");
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }
    tracing::info!(path = %path.display(), "would write (dry run)");
    Ok(WriteResult::WouldWrite {
        path: path.to_path_buf(),
    })
}

fn write_with_tmp<F>(path: &Path, render: F, tmp: &Path) -> Result<WriteResult, SyncError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    if let Some(parent) = tmp.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    if let Err(e) = render_into(tmp, render) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }

    if path.exists() {
        let same = file_digest(tmp)
            .and_then(|rendered| file_digest(path).map(|existing| existing == rendered));
        match same {
            Ok(true) => {
                std::fs::remove_file(tmp).map_err(|e| io_err(tmp, e))?;
                tracing::debug!(path = %path.display(), "unchanged");
                return Ok(WriteResult::Unchanged {
                    path: path.to_path_buf(),
                });
            }
            Ok(false) => {}
            Err(e) => {
                let _ = std::fs::remove_file(tmp);
                return Err(io_err(path, e));
            }
        }
    }

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!(path = %path.display(), "wrote");
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

fn render_into<F>(tmp: &Path, render: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut out = BufWriter::new(File::create(tmp)?);
    render(&mut out)?;
    out.flush()
}

/// Hex SHA-256 of a file, streamed.
fn file_digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn solution_in(dir: &TempDir) -> PathBuf {
        dir.path().join("Game.sln")
    }

    fn put(path: &Path, text: &str) -> WriteResult {
        write_bytes_if_changed(path, text.as_bytes(), false).unwrap()
    }

    /// Renders a header line plus one line per project, chunk by chunk.
    fn render_entries<'a>(
        entries: &'a [&'a str],
    ) -> impl FnOnce(&mut dyn Write) -> io::Result<()> + 'a {
        move |out| {
            out.write_all(b"Microsoft Visual Studio Solution File\n")?;
            for entry in entries {
                writeln!(out, "Project = \"{entry}\"")?;
            }
            Ok(())
        }
    }

    #[test]
    fn streamed_render_lands_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = solution_in(&dir);

        let result = write_if_changed(&path, render_entries(&["Game", "Core"]), false).unwrap();
        assert_eq!(result, WriteResult::Written { path: path.clone() });
        assert!(result.is_change());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Microsoft Visual Studio Solution File\nProject = \"Game\"\nProject = \"Core\"\n"
        );
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn identical_render_is_unchanged_and_keeps_mtime() {
        let dir = TempDir::new().unwrap();
        let path = solution_in(&dir);
        write_if_changed(&path, render_entries(&["Game"]), false).unwrap();

        let past = filetime::FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&path, past).unwrap();

        let result = write_if_changed(&path, render_entries(&["Game"]), false).unwrap();
        assert_eq!(result, WriteResult::Unchanged { path: path.clone() });
        assert!(!result.is_change());
        let mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
        assert_eq!(mtime, past, "target was rewritten");
        assert!(!tmp_path(&path).exists(), "temp file left behind");
    }

    #[test]
    fn different_render_replaces_target() {
        let dir = TempDir::new().unwrap();
        let path = solution_in(&dir);
        write_if_changed(&path, render_entries(&["Game"]), false).unwrap();

        let result = write_if_changed(&path, render_entries(&["Game", "Tools"]), false).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert!(fs::read_to_string(&path).unwrap().contains("Tools"));
    }

    #[test]
    fn newline_only_changes_count_as_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Game.csproj");
        put(&path, "<Project>\r\n</Project>\r\n");

        assert!(put(&path, "<Project>\n</Project>\n").is_change());
        assert_eq!(fs::read(&path).unwrap(), b"<Project>\n</Project>\n");
    }

    #[test]
    fn dry_run_never_touches_the_file_system() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("Assets").join("Game").join("Game.csproj");
        assert_eq!(
            write_bytes_if_changed(&missing, b"<Project />", true).unwrap(),
            WriteResult::WouldWrite { path: missing.clone() }
        );
        assert!(!missing.parent().unwrap().exists());

        let existing = solution_in(&dir);
        put(&existing, "same");
        assert!(!write_bytes_if_changed(&existing, b"same", true).unwrap().is_change());
        assert!(write_bytes_if_changed(&existing, b"other", true).unwrap().is_change());
        assert_eq!(fs::read_to_string(&existing).unwrap(), "same");
    }

    #[test]
    fn generated_project_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Assets").join("Game").join("Game.csproj");
        put(&path, "<Project />");
        assert_eq!(fs::read_to_string(&path).unwrap(), "<Project />");
    }

    #[test]
    fn failed_render_keeps_previous_solution() {
        let dir = TempDir::new().unwrap();
        let path = solution_in(&dir);
        put(&path, "previous");

        let err = write_if_changed(
            &path,
            |out| {
                out.write_all(b"Project = ")?;
                Err(io::Error::new(io::ErrorKind::Other, "entry could not be rendered"))
            },
            false,
        )
        .expect_err("render error must surface");
        assert!(matches!(err, SyncError::Io { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    #[cfg(unix)]
    fn failed_rename_keeps_previous_solution() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        let path = locked.join("Game.sln");
        fs::write(&path, "previous").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let scratch = TempDir::new().unwrap();
        let tmp = scratch.path().join("Game.sln.slnsync.tmp");
        let result = write_with_tmp(&path, render_entries(&["Game"]), &tmp);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // root may rename into read-only directories
        if result.is_ok() {
            return;
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
        assert!(!tmp.exists(), "temp file left behind");
    }
}
