//! Artifact writing.

use crate::output::EmitError;
use std::io::Write;
use std::path::Path;

/// Replace `path` with `content` through a temporary file in the same
/// directory, so readers never see a partial file. Returns `false` when the
/// file already had this content and was left untouched.
pub fn write_atomic(path: &Path, content: &str) -> Result<bool, EmitError> {
    if std::fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        tracing::debug!(path = %path.display(), "unchanged");
        return Ok(false);
    }
    let error = |source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(error)?;
    file.write_all(content.as_bytes()).map_err(error)?;
    file.persist(path).map_err(|e| error(e.error))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote artifact");
    Ok(true)
}
