//! # Hard-Disk Audio Cache
//!
//! Decodes an entire audio stream in the background into a memory-mapped
//! temporary file, so seeking and scrubbing never re-run the decoder and the
//! decoded stream never has to fit in RAM.
//!
//! ## Overview
//!
//! On construction the provider checks the cache directory has room for the
//! whole decoded stream, creates `audio-<unix_time>-<pid>` there at its final
//! size and starts one worker thread. The worker decodes fixed-size blocks
//! from the inner source straight into the mapping and publishes each
//! committed block through an atomic progress counter.
//!
//! Reads never wait for the worker. Samples below the progress counter come
//! from the file; samples at or above it are returned as silence, so playback
//! can start immediately and a later read of the same range returns real data
//! once the worker has caught up.
//!
//! ## Memory Ordering
//!
//! The worker stores progress with `Release` after a block's bytes are in the
//! mapping; readers load it with `Acquire` before copying. A reader that sees
//! progress `p` therefore sees every byte of samples `[0, p)`. The worker only
//! ever writes at or above `p`, so readers and the writer never touch the same
//! bytes.
//!
//! ## Teardown
//!
//! Dropping the provider cancels the worker, waits for it to finish its
//! current block and exit, then removes the temporary file.
//!
//! ## Usage
//!
//! ```ignore
//! use core_audio::{AudioProvider, HdAudioProvider, HdCacheOptions};
//!
//! let cached = HdAudioProvider::new(decoder, &cache_dir, &fs, HdCacheOptions::default())?;
//! let mut buf = vec![0u8; 4096 * cached.bytes_per_sample() as usize];
//! cached.get_audio(&mut buf, 0, 4096)?; // silence until the worker gets there
//! ```

use crate::cache::progress::CacheProgress;
use crate::cancellation::CancellationToken;
use crate::error::{AudioError, MappingError, Result};
use crate::mapping::{window_range, TempFileMapping};
use crate::provider::{check_buffer, AudioFormat, AudioProvider};
use bridge_traits::FileSystemAccess;
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, trace};

/// Samples decoded per worker iteration by default.
pub const DEFAULT_BLOCK_SAMPLES: u64 = core_runtime::config::DEFAULT_BLOCK_SAMPLES;

/// Name of the background fill thread.
pub const WORKER_THREAD_NAME: &str = "hd-audio-cache";

/// Name suffixes tried before giving up on a unique cache file name.
const MAX_NAME_ATTEMPTS: u32 = 1024;

/// Tuning for [`HdAudioProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdCacheOptions {
    /// Samples decoded and committed per worker iteration (default: 65536)
    pub block_samples: u64,
}

impl Default for HdCacheOptions {
    fn default() -> Self {
        Self {
            block_samples: DEFAULT_BLOCK_SAMPLES,
        }
    }
}

impl HdCacheOptions {
    /// Set the worker block size in samples.
    pub fn with_block_samples(mut self, samples: u64) -> Self {
        self.block_samples = samples;
        self
    }

    /// Validate options.
    pub fn validate(&self) -> Result<()> {
        if self.block_samples == 0 {
            return Err(AudioError::Config(core_runtime::Error::Config(
                "block_samples must be greater than 0".to_string(),
            )));
        }
        Ok(())
    }
}

/// State shared between the provider and its worker.
struct CacheShared {
    format: AudioFormat,
    source: Box<dyn AudioProvider>,
    mapping: TempFileMapping,
    /// Samples committed to `mapping`; only the worker stores.
    decoded: AtomicU64,
    cancel: CancellationToken,
    failure: Mutex<Option<String>>,
    block_samples: u64,
}

impl CacheShared {
    fn run(&self) {
        let total = self.format.num_samples;
        let bps = u64::from(self.format.bytes_per_sample);
        let started = Instant::now();
        let mut position = self.decoded.load(Ordering::Relaxed);

        info!(
            path = ?self.mapping.path(),
            total_samples = total,
            block_samples = self.block_samples,
            "Audio cache fill started"
        );

        while position < total {
            if self.cancel.is_cancelled() {
                info!(
                    "Audio cache fill cancelled at {} of {} samples",
                    position, total
                );
                return;
            }

            let block = self.block_samples.min(total - position);

            // SAFETY: readers only touch bytes below the published progress,
            // which is `position`; this window starts there.
            let window = match unsafe { self.mapping.write_window(position * bps, block * bps) } {
                Ok(window) => window,
                Err(e) => {
                    self.fail(position, e.to_string());
                    return;
                }
            };

            if let Err(e) = self.source.fill_buffer(window, position, block) {
                self.fail(position, e.to_string());
                return;
            }

            position += block;
            self.decoded.store(position, Ordering::Release);
            trace!(decoded = position, total, "Committed cache block");
        }

        info!(
            "Audio cache fill complete: {} samples in {:.2}s",
            total,
            started.elapsed().as_secs_f64()
        );
    }

    fn fail(&self, position: u64, message: String) {
        error!(
            path = ?self.mapping.path(),
            decoded = position,
            "Audio cache fill failed: {}",
            message
        );
        let mut failure = self.failure.lock();
        if failure.is_none() {
            *failure = Some(message);
        }
    }

    fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }
}

/// An [`AudioProvider`] that serves reads from a disk cache filled in the
/// background.
pub struct HdAudioProvider {
    shared: Arc<CacheShared>,
    worker: Option<JoinHandle<()>>,
}

impl HdAudioProvider {
    /// Wrap `source` with a disk cache in `cache_dir`.
    ///
    /// Fails with [`AudioError::CacheOpen`] if `cache_dir` lacks space for the
    /// whole decoded stream or the cache file cannot be created. Nothing is
    /// left on disk when construction fails.
    pub fn new(
        source: Box<dyn AudioProvider>,
        cache_dir: &Path,
        fs: &dyn FileSystemAccess,
        options: HdCacheOptions,
    ) -> Result<Self> {
        options.validate()?;

        let format = *source.format();
        let cache_open = |path: &Path, reason: String| AudioError::CacheOpen {
            path: path.to_path_buf(),
            reason,
        };

        let required = format.total_bytes().ok_or_else(|| {
            cache_open(
                cache_dir,
                format!(
                    "Audio stream of {} samples is too large to cache",
                    format.num_samples
                ),
            )
        })?;

        let available = fs.free_space(cache_dir).map_err(|e| {
            cache_open(cache_dir, format!("Failed to query free disk space: {}", e))
        })?;
        if available < required {
            debug!(required, available, "Refusing to create audio cache");
            return Err(cache_open(
                cache_dir,
                format!(
                    "Not enough free disk space in {} to cache the audio ({} bytes needed, {} available)",
                    cache_dir.display(),
                    required,
                    available
                ),
            ));
        }

        let mapping = create_unique_mapping(cache_dir, required)?;

        let shared = Arc::new(CacheShared {
            format,
            source,
            mapping,
            decoded: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            failure: Mutex::new(None),
            block_samples: options.block_samples,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                if panic::catch_unwind(AssertUnwindSafe(|| worker_shared.run())).is_err() {
                    let position = worker_shared.decoded.load(Ordering::Acquire);
                    worker_shared.fail(position, "Audio cache worker panicked".to_string());
                }
            })
            .map_err(|e| {
                cache_open(
                    shared.mapping.path(),
                    format!("Failed to start cache worker: {}", e),
                )
            })?;

        debug!(
            path = ?shared.mapping.path(),
            bytes = required,
            "Created audio cache"
        );

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Snapshot of fill progress.
    pub fn progress(&self) -> CacheProgress {
        CacheProgress::new(self.decoded_samples(), self.shared.format.num_samples)
    }

    /// Whether the whole stream is in the cache.
    pub fn is_complete(&self) -> bool {
        self.progress().is_complete()
    }

    /// The decode error that stopped the fill, if any.
    pub fn failure(&self) -> Option<String> {
        self.shared.failure()
    }

    /// Path of the temporary cache file.
    pub fn cache_path(&self) -> &Path {
        self.shared.mapping.path()
    }
}

impl AudioProvider for HdAudioProvider {
    fn format(&self) -> &AudioFormat {
        &self.shared.format
    }

    fn fill_buffer(&self, buf: &mut [u8], start: u64, count: u64) -> Result<()> {
        let shared = &self.shared;
        let bps = u64::from(shared.format.bytes_per_sample);
        check_buffer(buf, count, bps)?;

        let end = match start.checked_add(count) {
            Some(end) if end <= shared.format.num_samples => end,
            _ => {
                return Err(AudioError::Mapping(MappingError::OutOfBounds {
                    offset: start.saturating_mul(bps),
                    len: count.saturating_mul(bps),
                    size: shared.mapping.size(),
                }))
            }
        };

        let mut decoded = shared.decoded.load(Ordering::Acquire);
        if end > decoded {
            if let Some(message) = shared.failure() {
                // The worker may have committed more before failing.
                decoded = shared.decoded.load(Ordering::Acquire);
                if end > decoded {
                    return Err(AudioError::CacheFill { message });
                }
            }
        }

        let missing = count.min(end.saturating_sub(decoded));
        let available = count - missing;
        let head_len = window_range(0, available * bps, buf.len() as u64)?.end;
        let (head, tail) = buf.split_at_mut(head_len);
        tail.fill(0);

        if available > 0 {
            // SAFETY: [start, start + available) lies below `decoded`, which
            // the worker has finished writing and never revisits.
            let cached = unsafe { shared.mapping.read_window(start * bps, available * bps) }?;
            head.copy_from_slice(cached);
        }

        Ok(())
    }

    fn decoded_samples(&self) -> u64 {
        self.shared.decoded.load(Ordering::Acquire)
    }
}

impl fmt::Debug for HdAudioProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdAudioProvider")
            .field("path", &self.cache_path())
            .field("format", &self.shared.format)
            .field("decoded_samples", &self.decoded_samples())
            .field("failed", &self.failure().is_some())
            .finish()
    }
}

impl Drop for HdAudioProvider {
    fn drop(&mut self) {
        self.shared.cancel.cancel();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!(path = ?self.cache_path(), "Audio cache worker terminated abnormally");
            }
        }

        debug!(
            path = ?self.cache_path(),
            decoded = self.decoded_samples(),
            "Releasing audio cache"
        );
    }
}

/// Create `audio-<unix_time>-<pid>` in `dir`, adding a `-<n>` suffix while the
/// name is taken.
fn create_unique_mapping(dir: &Path, size: u64) -> Result<TempFileMapping> {
    let base = cache_file_stem();

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = if attempt == 0 {
            dir.join(&base)
        } else {
            dir.join(format!("{}-{}", base, attempt))
        };

        match TempFileMapping::create(&path, size) {
            Ok(mapping) => return Ok(mapping),
            Err(MappingError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                trace!(path = ?path, "Cache file name taken");
            }
            Err(e) => {
                return Err(AudioError::CacheOpen {
                    path,
                    reason: e.to_string(),
                })
            }
        }
    }

    Err(AudioError::CacheOpen {
        path: dir.join(base),
        reason: "No unused cache file name available".to_string(),
    })
}

fn cache_file_stem() -> String {
    format!("audio-{}-{}", Utc::now().timestamp(), std::process::id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::storage::MockFileSystemAccess;

    /// Whether `path` names a cache file created by this process.
    fn is_cache_file_name(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let mut parts = name.split('-');
        let pid = std::process::id().to_string();

        parts.next() == Some("audio")
            && parts
                .next()
                .is_some_and(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
            && parts.next() == Some(pid.as_str())
            && parts.all(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    }

    struct ConstSource {
        format: AudioFormat,
    }

    impl AudioProvider for ConstSource {
        fn format(&self) -> &AudioFormat {
            &self.format
        }

        fn fill_buffer(&self, buf: &mut [u8], _start: u64, _count: u64) -> Result<()> {
            buf.fill(0x5A);
            Ok(())
        }
    }

    fn fs_with_space(bytes: u64) -> MockFileSystemAccess {
        let mut fs = MockFileSystemAccess::new();
        fs.expect_free_space().returning(move |_| Ok(bytes));
        fs
    }

    fn source(num_samples: u64) -> Box<dyn AudioProvider> {
        Box::new(ConstSource {
            format: AudioFormat::mono_16(8000, num_samples),
        })
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_with_space(u64::MAX);
        let options = HdCacheOptions::default().with_block_samples(0);

        let err = HdAudioProvider::new(source(10), dir.path(), &fs, options).unwrap_err();
        assert!(matches!(err, AudioError::Config(_)));
    }

    #[test]
    fn test_cache_file_name_pattern() {
        let pid = std::process::id();
        assert!(is_cache_file_name(Path::new(&format!("/tmp/audio-1700000000-{pid}"))));
        assert!(is_cache_file_name(Path::new(&format!("audio-1700000000-{pid}-3"))));
        assert!(!is_cache_file_name(Path::new("audio-1700000000")));
        assert!(!is_cache_file_name(Path::new(&format!("video-1700000000-{pid}"))));
        assert!(is_cache_file_name(Path::new(&cache_file_stem())));
    }

    #[test]
    fn test_name_collision_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let first = create_unique_mapping(dir.path(), 16).unwrap();
        let second = create_unique_mapping(dir.path(), 16).unwrap();

        assert_ne!(first.path(), second.path());
        assert!(is_cache_file_name(first.path()));
        assert!(is_cache_file_name(second.path()));
    }

    #[test]
    fn test_fill_buffer_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_with_space(u64::MAX);
        let cache =
            HdAudioProvider::new(source(100), dir.path(), &fs, HdCacheOptions::default()).unwrap();

        let mut buf = vec![0u8; 20];
        let err = cache.fill_buffer(&mut buf, 95, 10).unwrap_err();
        assert!(matches!(err, AudioError::Mapping(MappingError::OutOfBounds { .. })));
    }

    #[test]
    fn test_debug_output() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_with_space(u64::MAX);
        let cache =
            HdAudioProvider::new(source(100), dir.path(), &fs, HdCacheOptions::default()).unwrap();

        let debug = format!("{:?}", cache);
        assert!(debug.contains("HdAudioProvider"));
        assert!(debug.contains("audio-"));
    }
}
