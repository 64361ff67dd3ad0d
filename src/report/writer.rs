//! Atomic document publication.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::ParseError;

/// Write `content` to `path` through a temporary file in the same
/// directory, renamed into place once complete. Readers never see a
/// partially written document.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ParseError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let wrap = |source| ParseError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(content.as_bytes()).map_err(wrap)?;
    keep_mode(tmp.as_file(), path).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}

/// Give the temporary file the mode of the document it replaces, or
/// `0644` for a new one. Temporary files start out owner-only.
#[cfg(unix)]
fn keep_mode(file: &File, target: &Path) -> io::Result<()> {
    use std::fs::{self, Permissions};
    use std::os::unix::fs::PermissionsExt;

    let permissions = match fs::metadata(target) {
        Ok(meta) => meta.permissions(),
        Err(_) => Permissions::from_mode(0o644),
    };
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn keep_mode(_file: &File, _target: &Path) -> io::Result<()> {
    Ok(())
}
