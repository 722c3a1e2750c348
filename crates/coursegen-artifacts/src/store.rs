//! Artifact persistence
//!
//! Rendered artifacts are written atomically into one directory under
//! timestamped names (`course_<YYYYmmddHHMMSS>.<ext>`). Lookups only accept bare
//! file names, so a request can never reach outside the directory.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use coursegen_utils::atomic_write::write_bytes_atomic;
use coursegen_utils::error::StoreError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

use crate::builder::{ArtifactKind, ArtifactRenderer, render_to_vec};
use crate::segment::SegmentedDocument;

const FILE_PREFIX: &str = "course_";

/// A freshly saved artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: Utf8PathBuf,
    pub kind: ArtifactKind,
    pub bytes_written: u64,
}

/// Listing entry for a stored file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    /// Seconds since the Unix epoch
    pub modified: f64,
}

#[derive(Debug)]
pub struct ArtifactStore {
    dir: Utf8PathBuf,
    // Serializes name selection and the write that claims it
    naming: Mutex<()>,
}

impl ArtifactStore {
    /// Open the store at `dir`, creating the directory if missing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created and
    /// `StoreError::InvalidName` if the path is not valid UTF-8.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let dir = Utf8PathBuf::from_path_buf(dir.to_path_buf()).map_err(|p| {
            StoreError::InvalidName {
                name: p.display().to_string(),
            }
        })?;
        debug!(dir = %dir, "Opened artifact store");
        Ok(Self {
            dir,
            naming: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Render `doc` and save it under a fresh timestamped name.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Render` if rendering fails and `StoreError::Persist`
    /// if the file cannot be written. Nothing is written when rendering fails.
    pub fn save(
        &self,
        renderer: &dyn ArtifactRenderer,
        doc: &SegmentedDocument,
    ) -> Result<StoredArtifact, StoreError> {
        self.save_at(renderer, doc, Local::now())
    }

    /// [`save`](Self::save) with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn save_at(
        &self,
        renderer: &dyn ArtifactRenderer,
        doc: &SegmentedDocument,
        now: DateTime<Local>,
    ) -> Result<StoredArtifact, StoreError> {
        let kind = renderer.kind();
        let (bytes, summary) = render_to_vec(renderer, doc)?;

        let _guard = self
            .naming
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let filename = self.unique_name(kind, now);
        let path = self.dir.join(&filename);

        let result = write_bytes_atomic(&path, &bytes).map_err(StoreError::Persist)?;
        for warning in &result.warnings {
            debug!(path = %path, warning = %warning, "Atomic write warning");
        }

        info!(
            filename = %filename,
            kind = %kind,
            units = summary.units,
            bytes = result.bytes_written,
            "Saved artifact"
        );

        Ok(StoredArtifact {
            filename,
            path,
            kind,
            bytes_written: result.bytes_written,
        })
    }

    fn unique_name(&self, kind: ArtifactKind, now: DateTime<Local>) -> String {
        let stem = format!("{FILE_PREFIX}{}", now.format("%Y%m%d%H%M%S"));
        let ext = kind.extension();

        let first = format!("{stem}.{ext}");
        if !self.dir.join(&first).exists() {
            return first;
        }

        (1u32..)
            .map(|n| format!("{stem}_{n}.{ext}"))
            .find(|name| !self.dir.join(name).exists())
            .unwrap_or(first)
    }

    /// Path of a stored file by bare name.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidName` for names with path separators, `..`, or a
    ///   leading dot
    /// - `StoreError::NotFound` if no such regular file exists
    pub fn resolve(&self, filename: &str) -> Result<Utf8PathBuf, StoreError> {
        if !is_bare_name(filename) {
            return Err(StoreError::InvalidName {
                name: filename.to_string(),
            });
        }

        let path = self.dir.join(filename);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StoreError::NotFound {
                name: filename.to_string(),
            })
        }
    }

    /// Every regular file in the store, sorted by name.
    ///
    /// Hidden files (in-progress temp files among them) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<StoredFile>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.dir.clone().into_std_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let metadata = entry.metadata().map_err(io_err)?;
            if !metadata.is_file() {
                continue;
            }

            let modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0.0, |d| d.as_secs_f64());

            files.push(StoredFile {
                name,
                size: metadata.len(),
                modified,
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

fn is_bare_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
        && Utf8Path::new(name).components().count() == 1
}
