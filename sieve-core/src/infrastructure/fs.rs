// sieve-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `content` to `path` through a sibling temp file and a rename, so
/// readers of the target never observe a half-written report.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    // Same directory as the target: rename stays on one filesystem
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Pretty JSON variant of [`atomic_write`].
pub fn write_json<P: AsRef<Path>, T: Serialize>(
    path: P,
    data: &T,
) -> Result<(), InfrastructureError> {
    let content = serde_json::to_string_pretty(data)?;
    atomic_write(path, content)
}
