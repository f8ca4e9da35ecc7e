//! # Temporary File Mapping
//!
//! A fixed-size temporary file mapped read/write into memory. The disk cache
//! writes decoded blocks through one window while readers copy out of others.
//!
//! ## Safety
//!
//! The mapping hands out raw windows over shared memory and performs no
//! synchronization of its own. Callers must ensure a write window never
//! overlaps a window that is read at the same time. The disk cache does this
//! with its progress counter: bytes below it are only read, bytes at or above
//! it are only written by the single worker.
//!
//! The file is created exclusively and removed when the mapping is dropped,
//! including when creation fails partway.

use crate::error::MappingError;
use memmap2::MmapRaw;
use std::fs::{File, OpenOptions};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A temporary file of fixed size, mapped into memory.
#[derive(Debug)]
pub struct TempFileMapping {
    path: PathBuf,
    size: u64,
    map: Option<MmapRaw>,
    file: Option<File>,
}

impl TempFileMapping {
    /// Create `path` exclusively, size it to `size` bytes and map it.
    ///
    /// Fails with `io::ErrorKind::AlreadyExists` if the file is already there;
    /// the existing file is left untouched in that case. A zero-sized file is
    /// created but not mapped.
    pub fn create(path: impl Into<PathBuf>, size: u64) -> Result<Self, MappingError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        // From here on the file is ours; dropping `mapping` on an error path
        // removes it again.
        let mut mapping = Self {
            path,
            size,
            map: None,
            file: None,
        };

        file.set_len(size)?;
        if size > 0 {
            mapping.map = Some(MmapRaw::map_raw(&file)?);
        }
        mapping.file = Some(file);

        debug!(path = ?mapping.path, size, "Mapped temporary file");
        Ok(mapping)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the mapping in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Writable window of `len` bytes at `offset`.
    ///
    /// # Safety
    ///
    /// No other window overlapping this range may be alive while the returned
    /// slice is in use.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn write_window(&self, offset: u64, len: u64) -> Result<&mut [u8], MappingError> {
        match self.window_ptr(offset, len)? {
            Some((ptr, len)) => Ok(std::slice::from_raw_parts_mut(ptr, len)),
            None => Ok(&mut []),
        }
    }

    /// Read-only window of `len` bytes at `offset`.
    ///
    /// # Safety
    ///
    /// No write window overlapping this range may be alive while the returned
    /// slice is in use.
    pub unsafe fn read_window(&self, offset: u64, len: u64) -> Result<&[u8], MappingError> {
        match self.window_ptr(offset, len)? {
            Some((ptr, len)) => Ok(std::slice::from_raw_parts(ptr as *const u8, len)),
            None => Ok(&[]),
        }
    }

    /// Flush a byte range of the mapping to the file.
    pub fn flush_range(&self, offset: u64, len: u64) -> Result<(), MappingError> {
        let range = window_range(offset, len, self.size)?;
        match &self.map {
            Some(map) if !range.is_empty() => Ok(map.flush_range(range.start, range.len())?),
            _ => Ok(()),
        }
    }

    /// Pointer to the start of a bounds-checked window and its length in
    /// bytes, `None` when empty.
    fn window_ptr(&self, offset: u64, len: u64) -> Result<Option<(*mut u8, usize)>, MappingError> {
        let range = window_range(offset, len, self.size)?;
        if range.is_empty() {
            return Ok(None);
        }
        match &self.map {
            // SAFETY: range.end <= size == map.len(), so the pointer stays
            // inside the mapping.
            Some(map) => Ok(Some((
                unsafe { map.as_mut_ptr().add(range.start) },
                range.len(),
            ))),
            None => Err(MappingError::OutOfBounds {
                offset,
                len,
                size: 0,
            }),
        }
    }
}

/// Byte range `offset..offset + len` as addressable indices.
///
/// Fails when the window leaves `0..size` or does not fit in `usize`, which
/// happens for caches over 4 GiB on 32-bit targets.
pub(crate) fn window_range(offset: u64, len: u64, size: u64) -> Result<Range<usize>, MappingError> {
    let out_of_bounds = || MappingError::OutOfBounds { offset, len, size };
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= size)
        .ok_or_else(out_of_bounds)?;
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let end = usize::try_from(end).map_err(|_| out_of_bounds())?;
    Ok(start..end)
}

impl Drop for TempFileMapping {
    fn drop(&mut self) {
        // Unmap and close before unlinking so the removal succeeds on Windows.
        drop(self.map.take());
        drop(self.file.take());

        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "Removed temporary file"),
            Err(e) => warn!(path = ?self.path, error = %e, "Failed to remove temporary file"),
        }
    }
}
