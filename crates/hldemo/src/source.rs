//! Lazy file-to-buffer lifecycle for the decoder.
//!
//! [`FileSource`] owns a demo file's path, its open handle, and its total
//! size, and materializes the byte blob backing a [`BitCursor`] on demand.
//! The decoder runs two passes — a cheap structural pass (header plus
//! directory) and a full-content pass (every frame) — and releasing the blob
//! between them caps peak memory for large files.
//!
//! The acquire/release pair is deliberately explicit rather than scoped:
//! the decoder controls the exact moment the blob is dropped.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::cursor::BitCursor;
use crate::error::DemoError;

/// A demo file plus the optional in-memory blob currently backing reads.
///
/// The file handle stays open for the lifetime of the source, so repeated
/// acquires reread from the same handle.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: File,
    size: u64,
    cursor: Option<BitCursor>,
}

impl FileSource {
    /// Open a file and record its size. No data is loaded yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DemoError> {
        let path = path.into();
        let file = File::open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            size,
            cursor: None,
        })
    }

    /// Load the whole file into memory and bind a fresh cursor over it,
    /// replacing any previously acquired blob.
    pub fn acquire(&mut self) -> Result<(), DemoError> {
        self.acquire_prefix(self.size)
    }

    /// Load the first `bytes` bytes of the file into memory and bind a
    /// fresh cursor over them. Asking for more bytes than the file holds
    /// fails with [`DemoError::Io`].
    pub fn acquire_prefix(&mut self, bytes: u64) -> Result<(), DemoError> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut blob = vec![0u8; bytes as usize];
        self.file.read_exact(&mut blob)?;
        self.cursor = Some(BitCursor::new(blob));
        Ok(())
    }

    /// Drop the in-memory blob. Reads fail with [`DemoError::NotAcquired`]
    /// until [`acquire`](Self::acquire) is called again.
    pub fn release(&mut self) {
        self.cursor = None;
    }

    /// True while a byte blob is bound.
    pub fn is_acquired(&self) -> bool {
        self.cursor.is_some()
    }

    /// Borrow the bound cursor for reading and seeking.
    pub fn cursor_mut(&mut self) -> Result<&mut BitCursor, DemoError> {
        self.cursor.as_mut().ok_or(DemoError::NotAcquired)
    }

    /// The path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total file size in bytes, captured at open time.
    pub fn size(&self) -> u64 {
        self.size
    }
}
