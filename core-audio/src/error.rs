//! # Audio Error Types
//!
//! Error types for audio providers, the disk cache and its backing store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or caching audio.
#[derive(Error, Debug)]
pub enum AudioError {
    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// The disk cache could not be created at the given location.
    ///
    /// Permanent: retrying the same directory fails again until space is
    /// freed or another location is chosen.
    #[error("Failed to open audio cache at {}: {reason}", .path.display())]
    CacheOpen { path: PathBuf, reason: String },

    /// The background fill stopped on a decode error and the requested
    /// samples will never become available.
    #[error("Audio cache fill failed: {message}")]
    CacheFill { message: String },

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The inner source failed to produce PCM.
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Destination buffer does not match the requested sample count.
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: u64, actual: usize },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Backing store access failed.
    #[error("Backing store error: {0}")]
    Mapping(#[from] MappingError),

    /// Invalid cache configuration.
    #[error("Configuration error: {0}")]
    Config(#[source] core_runtime::Error),

    /// Host bridge failure, such as an unavailable temp directory.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl From<core_runtime::Error> for AudioError {
    fn from(err: core_runtime::Error) -> Self {
        match err {
            core_runtime::Error::Bridge(e) => AudioError::Bridge(e),
            other => AudioError::Config(other),
        }
    }
}

impl AudioError {
    /// Returns `true` if retrying the same operation cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AudioError::CacheOpen { .. } | AudioError::CacheFill { .. }
        )
    }
}

/// Errors from the memory-mapped backing store.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A window reached outside the fixed-size mapping.
    #[error("Window of {len} bytes at offset {offset} is outside the {size}-byte mapping")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// Creating, sizing or mapping the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for audio operations.
pub type Result<T> = std::result::Result<T, AudioError>;
