// src/engine/storage.rs
//
// Temporary storage area for encoded outputs.
//
// A shared directory that concurrent workers write uniquely named files into.
// The handle is passed in explicitly so every caller (and every test) can
// point it at its own directory. Sweeping the area while a batch is writing
// into it is the caller's responsibility to avoid.

use crate::error::TranscodeError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

type StorageResult<T> = std::result::Result<T, TranscodeError>;

/// Extension of every output file
pub const OUTPUT_EXTENSION: &str = "webp";

#[derive(Clone, Debug)]
pub struct TempStorage {
    root: PathBuf,
}

impl TempStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory (and parents) if it does not exist yet.
    pub fn ensure(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| TranscodeError::storage_failed(self.root.display().to_string(), e))
    }

    pub fn path_for(&self, filename: &str) -> StorageResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.path_for(filename)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Write `bytes` under `filename` and return the size on disk.
    ///
    /// The data goes to an anonymous temp file in the same directory first and
    /// is renamed into place only once fully written, so a failed write never
    /// leaves a partial output behind. An existing file with the same name is
    /// never overwritten.
    pub fn persist(&self, filename: &str, bytes: &[u8]) -> StorageResult<u64> {
        let output_path = self.path_for(filename)?;
        let display = || output_path.display().to_string();

        let mut temp_file = NamedTempFile::new_in(&self.root)
            .map_err(|e| TranscodeError::storage_failed(self.root.display().to_string(), e))?;
        temp_file
            .write_all(bytes)
            .map_err(|e| TranscodeError::storage_failed(display(), e))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|e| TranscodeError::storage_failed(display(), e))?;

        // On failure the temp file is handed back inside the error and
        // removed when it drops
        temp_file
            .persist_noclobber(&output_path)
            .map_err(|e| TranscodeError::storage_failed(display(), e.error))?;

        let written = fs::metadata(&output_path)
            .map_err(|e| TranscodeError::storage_failed(display(), e))?
            .len();
        Ok(written)
    }

    /// Delete a single output.
    pub fn remove(&self, filename: &str) -> StorageResult<()> {
        let path = self.path_for(filename)?;
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TranscodeError::file_not_found(filename.to_string())
            } else {
                TranscodeError::storage_failed(path.display().to_string(), e)
            }
        })
    }

    /// Remove every file in the storage area and return how many were removed.
    /// The directory itself is kept (and recreated if it vanished).
    pub fn sweep(&self) -> StorageResult<usize> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.ensure()?;
                return Ok(0);
            }
            Err(e) => {
                return Err(TranscodeError::storage_failed(
                    self.root.display().to_string(),
                    e,
                ))
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry
                .map_err(|e| TranscodeError::storage_failed(self.root.display().to_string(), e))?;
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => removed += 1,
                // Raced with a concurrent delete
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(TranscodeError::storage_failed(
                        path.display().to_string(),
                        e,
                    ))
                }
            }
        }
        tracing::info!(root = %self.root.display(), removed, "temporary storage swept");
        Ok(removed)
    }

    /// Encoded outputs currently in the storage area, sorted by file name.
    pub fn list_outputs(&self) -> StorageResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| TranscodeError::storage_failed(self.root.display().to_string(), e))?;
        let mut outputs = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| TranscodeError::storage_failed(self.root.display().to_string(), e))?
                .path();
            let is_output = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION))
                .unwrap_or(false);
            if is_output && path.is_file() {
                outputs.push(path);
            }
        }
        outputs.sort();
        Ok(outputs)
    }
}

/// Only bare file names are allowed: no separators, no `..`, not empty.
fn validate_filename(filename: &str) -> StorageResult<()> {
    let bare = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\'])
        && !filename.contains('\0');
    if bare {
        Ok(())
    } else {
        Err(TranscodeError::invalid_argument(
            "filename",
            filename.to_string(),
            "must be a bare file name",
        ))
    }
}
