//! Mapping source library paths onto the mirror.

use std::path::{Path, PathBuf};

use lm_core::{Error, Result};

/// Map `path` under `source_root` to the same relative location under
/// `dest_root`, with its extension replaced by `extension`.
///
/// A leading `.` on `extension` is ignored, so `"mp3"` and `".mp3"` are
/// equivalent.
///
/// ```
/// use std::path::Path;
/// use lossymirror::rebase::rebase_path;
///
/// let dest = rebase_path(
///     Path::new("/music/a/b/c.flac"),
///     Path::new("/music"),
///     Path::new("/out"),
///     ".mp3",
/// )?;
/// assert_eq!(dest, Path::new("/out/a/b/c.mp3"));
/// # Ok::<(), lm_core::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::Path`] if `path` does not live under `source_root`.
pub fn rebase_path(
    path: &Path,
    source_root: &Path,
    dest_root: &Path,
    extension: &str,
) -> Result<PathBuf> {
    let relative = relative_to(path, source_root)?;
    Ok(dest_root
        .join(relative)
        .with_extension(extension.trim_start_matches('.')))
}

/// Like [`rebase_path`] but keeps the original extension.
pub fn rebase_path_keep_extension(
    path: &Path,
    source_root: &Path,
    dest_root: &Path,
) -> Result<PathBuf> {
    Ok(dest_root.join(relative_to(path, source_root)?))
}

fn relative_to<'a>(path: &'a Path, root: &Path) -> Result<&'a Path> {
    match path.strip_prefix(root) {
        // The root itself is a directory, never a file to mirror.
        Ok(rel) if rel.as_os_str().is_empty() => Err(Error::path(path, root)),
        Ok(rel) => Ok(rel),
        Err(_) => Err(Error::path(path, root)),
    }
}
