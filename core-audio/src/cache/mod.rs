//! # Audio Caches
//!
//! Decorators that sit between a decoder and its readers. The editor picks
//! one from its [`AudioCacheConfig`] when a file is opened.
//!
//! - [`hd`] - decode ahead into a memory-mapped temporary file
//! - [`progress`] - fill progress snapshots

pub mod hd;
pub mod progress;

pub use hd::{HdAudioProvider, HdCacheOptions};
pub use progress::CacheProgress;

use crate::error::{AudioError, Result};
use crate::provider::AudioProvider;
use bridge_traits::FileSystemAccess;
use core_runtime::config::{AudioCacheConfig, CacheType};
use tracing::{debug, info};

/// Wrap `source` in the cache selected by `config`.
///
/// With [`CacheType::None`] the source is returned unchanged. With
/// [`CacheType::Disk`] the configured location is resolved, created if
/// missing, and a [`HdAudioProvider`] is built in it.
pub fn create_cache_provider(
    source: Box<dyn AudioProvider>,
    config: &AudioCacheConfig,
    fs: &dyn FileSystemAccess,
) -> Result<Box<dyn AudioProvider>> {
    config.validate()?;

    match config.cache_type {
        CacheType::None => {
            debug!("Audio caching disabled");
            Ok(source)
        }
        CacheType::Disk => {
            let cache_dir = config.resolve_cache_dir(fs)?;
            fs.create_dir_all(&cache_dir)
                .map_err(|e| AudioError::CacheOpen {
                    path: cache_dir.clone(),
                    reason: format!("Failed to create cache directory: {}", e),
                })?;

            let options = HdCacheOptions::default().with_block_samples(config.block_samples);
            let provider = HdAudioProvider::new(source, &cache_dir, fs, options)?;
            info!(path = ?provider.cache_path(), "Caching audio on disk");
            Ok(Box::new(provider))
        }
    }
}
