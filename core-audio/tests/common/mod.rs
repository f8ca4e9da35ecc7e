//! Shared sources and helpers for the cache integration tests.

#![allow(dead_code)]

use bridge_traits::storage::MockFileSystemAccess;
use core_audio::{AudioError, AudioFormat, AudioProvider, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// Byte `i` of the decoded stream. Never zero, so silence is distinguishable.
pub fn pattern_byte(index: u64) -> u8 {
    (index % 251 + 1) as u8
}

/// The decoded bytes of samples `[start, start + count)`.
pub fn expected_bytes(start: u64, count: u64, bytes_per_sample: u32) -> Vec<u8> {
    let bps = u64::from(bytes_per_sample);
    (start * bps..(start + count) * bps).map(pattern_byte).collect()
}

fn fill_pattern(buf: &mut [u8], start: u64, bytes_per_sample: u32) {
    let base = start * u64::from(bytes_per_sample);
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = pattern_byte(base + i as u64);
    }
}

/// Deterministic source that records every request it serves.
pub struct PatternSource {
    format: AudioFormat,
    calls: Mutex<Vec<(u64, u64)>>,
    delay: Duration,
}

impl PatternSource {
    pub fn new(num_samples: u64, bytes_per_sample: u32) -> Self {
        Self {
            format: AudioFormat::new(44100, 1, bytes_per_sample, num_samples),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long in every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Requests seen by a [`PatternSource`] after it was moved into a cache.
#[derive(Clone)]
pub struct CallLog(std::sync::Arc<PatternSource>);

impl CallLog {
    pub fn calls(&self) -> Vec<(u64, u64)> {
        self.0.calls.lock().clone()
    }
}

/// Forwards to a shared [`PatternSource`] so the test keeps a handle to it.
pub struct SharedSource(pub std::sync::Arc<PatternSource>);

impl SharedSource {
    pub fn new(source: PatternSource) -> (Self, CallLog) {
        let shared = std::sync::Arc::new(source);
        (Self(shared.clone()), CallLog(shared))
    }
}

impl AudioProvider for PatternSource {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn fill_buffer(&self, buf: &mut [u8], start: u64, count: u64) -> Result<()> {
        assert_eq!(buf.len() as u64, count * u64::from(self.format.bytes_per_sample));
        assert!(start + count <= self.format.num_samples);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        fill_pattern(buf, start, self.format.bytes_per_sample);
        self.calls.lock().push((start, count));
        Ok(())
    }
}

impl AudioProvider for SharedSource {
    fn format(&self) -> &AudioFormat {
        self.0.format()
    }

    fn fill_buffer(&self, buf: &mut [u8], start: u64, count: u64) -> Result<()> {
        self.0.fill_buffer(buf, start, count)
    }
}

/// Serves one request per permit. Once the sender is dropped every request
/// proceeds immediately.
pub struct GatedSource {
    format: AudioFormat,
    permits: Mutex<Receiver<()>>,
}

impl GatedSource {
    pub fn new(num_samples: u64, bytes_per_sample: u32) -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let source = Self {
            format: AudioFormat::new(44100, 1, bytes_per_sample, num_samples),
            permits: Mutex::new(rx),
        };
        (source, tx)
    }
}

impl AudioProvider for GatedSource {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn fill_buffer(&self, buf: &mut [u8], start: u64, _count: u64) -> Result<()> {
        let _ = self.permits.lock().recv();
        fill_pattern(buf, start, self.format.bytes_per_sample);
        Ok(())
    }
}

/// Decodes normally until `fail_at`, then reports a decode error.
pub struct FailingSource {
    format: AudioFormat,
    fail_at: u64,
    attempts: AtomicU64,
}

impl FailingSource {
    pub fn new(num_samples: u64, bytes_per_sample: u32, fail_at: u64) -> Self {
        Self {
            format: AudioFormat::new(44100, 1, bytes_per_sample, num_samples),
            fail_at,
            attempts: AtomicU64::new(0),
        }
    }
}

impl AudioProvider for FailingSource {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn fill_buffer(&self, buf: &mut [u8], start: u64, count: u64) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if start + count > self.fail_at {
            return Err(AudioError::Decode(format!(
                "corrupt packet at sample {}",
                self.fail_at
            )));
        }
        fill_pattern(buf, start, self.format.bytes_per_sample);
        Ok(())
    }
}

/// A file system bridge reporting `free` bytes available everywhere.
pub fn fs_with_free_space(free: u64) -> MockFileSystemAccess {
    let mut fs = MockFileSystemAccess::new();
    fs.expect_free_space().returning(move |_| Ok(free));
    fs
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Number of entries in `dir`.
pub fn dir_entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
