//! Atomic file writes
//!
//! Artifacts are written to a temporary file in the target directory, synced,
//! and renamed into place, so readers never observe a partially written file.
//! When the rename crosses filesystems the content is copied and synced instead.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Number of bytes written
    pub bytes_written: u64,
    /// Whether cross-filesystem fallback was used
    pub used_cross_filesystem_fallback: bool,
    pub warnings: Vec<String>,
}

/// Atomically write `bytes` to `path` using temp file + fsync + rename.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, synced or
/// moved into place.
pub fn write_bytes_atomic(path: &Utf8Path, bytes: &[u8]) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult {
        bytes_written: bytes.len() as u64,
        ..AtomicWriteResult::default()
    };

    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;
    temp_file
        .write_all(bytes)
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    let temp_path = temp_file.path().to_path_buf();

    match temp_file.persist(path.as_std_path()) {
        Ok(_) => {}
        Err(e) if is_cross_filesystem_error(&e.error) => {
            result.used_cross_filesystem_fallback = true;
            result
                .warnings
                .push("Used cross-filesystem fallback (copy, fsync, replace)".to_string());
            // Keep the temp file alive until the copy is done.
            let _temp = e.file;
            copy_and_sync(&temp_path, path)?;
        }
        Err(e) => {
            return Err(anyhow::anyhow!(e.error))
                .with_context(|| format!("Failed to atomically write file: {path}"));
        }
    }

    Ok(result)
}

/// Atomically write UTF-8 text, normalizing line endings to LF.
///
/// # Errors
///
/// See [`write_bytes_atomic`].
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    write_bytes_atomic(path, normalized.as_bytes())
}

fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    // EXDEV on Linux/macOS, ERROR_NOT_SAME_DEVICE on Windows
    if cfg!(windows) {
        err.raw_os_error() == Some(17)
    } else {
        err.raw_os_error() == Some(18)
    }
}

fn copy_and_sync(source: &Path, target: &Utf8Path) -> Result<()> {
    fs::copy(source, target.as_std_path())
        .with_context(|| format!("Failed to copy {} to {target}", source.display()))?;
    let file = fs::OpenOptions::new()
        .write(true)
        .open(target.as_std_path())
        .with_context(|| format!("Failed to reopen {target} for sync"))?;
    file.sync_all()
        .with_context(|| format!("Failed to fsync {target}"))?;
    Ok(())
}
