// src/engine/io.rs
//
// I/O operations: upload handles and their byte sources

use crate::error::TranscodeError;
use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Upload byte source - in-memory data or a spooled file on disk
#[derive(Clone, Debug)]
pub enum Source {
    /// In-memory upload body
    Memory(Arc<Vec<u8>>),
    /// File path, mapped only when a worker picks the job up
    Path(PathBuf),
}

/// Bytes of an opened source. Borrowed as `&[u8]` for decoding.
pub enum SourceBytes {
    Memory(Arc<Vec<u8>>),
    Mapped(Mmap),
}

impl Deref for SourceBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            SourceBytes::Memory(data) => data.as_slice(),
            SourceBytes::Mapped(mmap) => mmap.as_ref(),
        }
    }
}

impl Source {
    /// Open the source for reading. Path sources are memory-mapped.
    pub fn open(&self, name: &str) -> Result<SourceBytes, TranscodeError> {
        match self {
            Source::Memory(data) => Ok(SourceBytes::Memory(Arc::clone(data))),
            Source::Path(path) => {
                let file = File::open(path)
                    .map_err(|e| TranscodeError::file_read_failed(name.to_string(), e))?;
                let len = file
                    .metadata()
                    .map_err(|e| TranscodeError::file_read_failed(name.to_string(), e))?
                    .len();
                // Zero-length files cannot be mapped on every platform
                if len == 0 {
                    return Ok(SourceBytes::Memory(Arc::new(Vec::new())));
                }
                // Safety: spooled uploads are owned by the request for its
                // whole lifetime and are not modified while a batch runs.
                let mmap = unsafe {
                    Mmap::map(&file)
                        .map_err(|e| TranscodeError::file_read_failed(name.to_string(), e))?
                };
                Ok(SourceBytes::Mapped(mmap))
            }
        }
    }
}

/// One submitted file: a name, a declared content type, a byte length and
/// byte access.
#[derive(Clone, Debug)]
pub struct Upload {
    name: String,
    content_type: String,
    size: u64,
    source: Source,
}

impl Upload {
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            source: Source::Memory(Arc::new(data)),
        }
    }

    /// Wrap a spooled upload on disk. The file is stat'ed now for its size and
    /// read later by whichever worker processes it.
    pub fn from_path(
        name: impl Into<String>,
        content_type: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, TranscodeError> {
        let name = name.into();
        let path = path.as_ref();
        let size = std::fs::metadata(path)
            .map_err(|e| TranscodeError::file_read_failed(name.clone(), e))?
            .len();
        Ok(Self {
            name,
            content_type: content_type.into(),
            size,
            source: Source::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Original byte size of the upload
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn open(&self) -> Result<SourceBytes, TranscodeError> {
        self.source.open(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn memory_upload_reports_size_and_bytes() {
        let upload = Upload::from_bytes("a.png", "image/png", vec![1, 2, 3]);
        assert_eq!(upload.size(), 3);
        assert_eq!(upload.name(), "a.png");
        assert_eq!(upload.content_type(), "image/png");
        assert_eq!(&*upload.open().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn path_upload_is_mapped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello image").unwrap();
        let upload = Upload::from_path("x.jpg", "image/jpeg", file.path()).unwrap();
        assert_eq!(upload.size(), 11);
        let bytes = upload.open().unwrap();
        assert!(matches!(bytes, SourceBytes::Mapped(_)));
        assert_eq!(&*bytes, b"hello image");
    }

    #[test]
    fn empty_path_upload_reads_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let upload = Upload::from_path("empty.png", "image/png", file.path()).unwrap();
        assert_eq!(upload.size(), 0);
        assert!(upload.open().unwrap().is_empty());
    }

    #[test]
    fn missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Upload::from_path("gone.png", "image/png", dir.path().join("gone.png"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
        assert!(err.to_string().contains("gone.png"));
    }
}
