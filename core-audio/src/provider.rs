//! # Audio Provider Traits
//!
//! The read surface shared by every audio source in the editor: decoders,
//! converters and caches all implement [`AudioProvider`], so the audio display
//! and playback code never needs to know which one it is talking to.
//!
//! ## Threading Model
//!
//! Providers are `Send + Sync` and take `&self` for reads. A cache reads its
//! inner source from a worker thread while the UI and playback threads read the
//! cache, so implementations with decoder state keep it behind interior
//! mutability.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use core_audio::AudioProvider;
//!
//! fn peak(provider: &dyn AudioProvider, start: i64, count: i64) -> core_audio::Result<u8> {
//!     let mut buf = vec![0u8; count as usize * provider.bytes_per_sample() as usize];
//!     provider.get_audio(&mut buf, start, count)?;
//!     Ok(buf.into_iter().max().unwrap_or(0))
//! }
//! ```

use crate::error::{AudioError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Describes the decoded PCM a provider produces.
///
/// Immutable for the lifetime of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of audio channels (1 = mono, 2 = stereo, etc.)
    pub channels: u16,
    /// Bytes of one sample across all channels
    pub bytes_per_sample: u32,
    /// Whether samples are IEEE floats rather than signed integers
    pub float: bool,
    /// Total samples in the stream
    pub num_samples: u64,
}

impl AudioFormat {
    /// Create a new integer PCM format descriptor.
    pub fn new(sample_rate: u32, channels: u16, bytes_per_sample: u32, num_samples: u64) -> Self {
        Self {
            sample_rate,
            channels,
            bytes_per_sample,
            float: false,
            num_samples,
        }
    }

    /// 16-bit mono, the layout the editor's audio display consumes.
    pub fn mono_16(sample_rate: u32, num_samples: u64) -> Self {
        Self::new(sample_rate, 1, 2, num_samples)
    }

    /// Mark the samples as floating point.
    pub fn with_float(mut self, float: bool) -> Self {
        self.float = float;
        self
    }

    /// Byte length of `samples` samples, or `None` on overflow.
    pub fn bytes_for(&self, samples: u64) -> Option<u64> {
        samples.checked_mul(u64::from(self.bytes_per_sample))
    }

    /// Byte length of the whole decoded stream, or `None` on overflow.
    pub fn total_bytes(&self) -> Option<u64> {
        self.bytes_for(self.num_samples)
    }

    /// Playback length of the stream.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.num_samples as f64 / f64::from(self.sample_rate))
    }
}

/// A source of decoded PCM audio.
pub trait AudioProvider: Send + Sync {
    /// Stream layout and length.
    fn format(&self) -> &AudioFormat;

    /// Write exactly `count` samples starting at `start` into `buf`.
    ///
    /// `buf.len()` must be `count * bytes_per_sample` and the range must lie
    /// within the stream; use [`AudioProvider::get_audio`] for requests that may
    /// run past either end.
    fn fill_buffer(&self, buf: &mut [u8], start: u64, count: u64) -> Result<()>;

    /// Samples from the start of the stream that can be read without delay.
    ///
    /// Direct sources report the whole stream; caches report their progress.
    fn decoded_samples(&self) -> u64 {
        self.format().num_samples
    }

    /// Total samples in the stream.
    fn num_samples(&self) -> u64 {
        self.format().num_samples
    }

    /// Bytes of one sample across all channels.
    fn bytes_per_sample(&self) -> u32 {
        self.format().bytes_per_sample
    }

    /// Read `count` samples starting at `start`, which may be negative or run
    /// past the end of the stream. Samples outside the stream are silence.
    fn get_audio(&self, buf: &mut [u8], start: i64, count: i64) -> Result<()> {
        if count <= 0 {
            return Ok(());
        }

        let total = self.num_samples();
        let bps = u64::from(self.bytes_per_sample());
        let count = count as u64;
        check_buffer(buf, count, bps)?;

        // Samples before 0, then the in-range part, then samples past the end.
        let leading = if start < 0 {
            start.unsigned_abs().min(count)
        } else {
            0
        };
        let first = start.max(0) as u64;
        let available = (count - leading).min(total.saturating_sub(first));

        let (before, rest) = buf.split_at_mut((leading * bps) as usize);
        let (inside, after) = rest.split_at_mut((available * bps) as usize);
        before.fill(0);
        after.fill(0);

        if available == 0 {
            return Ok(());
        }
        self.fill_buffer(inside, first, available)
    }
}

/// Verify `buf` holds exactly `count` samples of `bps` bytes each.
pub(crate) fn check_buffer(buf: &[u8], count: u64, bps: u64) -> Result<()> {
    match count.checked_mul(bps) {
        Some(expected) if expected == buf.len() as u64 => Ok(()),
        expected => Err(AudioError::BufferSize {
            expected: expected.unwrap_or(u64::MAX),
            actual: buf.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample `i` is the single byte `i % 250 + 1`.
    struct RampSource {
        format: AudioFormat,
    }

    impl AudioProvider for RampSource {
        fn format(&self) -> &AudioFormat {
            &self.format
        }

        fn fill_buffer(&self, buf: &mut [u8], start: u64, count: u64) -> Result<()> {
            assert!(start + count <= self.format.num_samples);
            for (i, byte) in buf.iter_mut().enumerate() {
                *byte = ((start + i as u64) % 250 + 1) as u8;
            }
            Ok(())
        }
    }

    fn ramp(num_samples: u64) -> RampSource {
        RampSource {
            format: AudioFormat::new(8000, 1, 1, num_samples),
        }
    }

    #[test]
    fn test_format_helpers() {
        let format = AudioFormat::mono_16(44100, 88200);
        assert_eq!(format.total_bytes(), Some(176_400));
        assert_eq!(format.bytes_for(10), Some(20));
        assert_eq!(format.duration(), Duration::from_secs(2));
        assert!(!format.float);
        assert!(format.with_float(true).float);

        let huge = AudioFormat::new(48000, 8, 32, u64::MAX);
        assert_eq!(huge.total_bytes(), None);
    }

    #[test]
    fn test_get_audio_in_range() {
        let source = ramp(100);
        let mut buf = vec![0u8; 10];
        source.get_audio(&mut buf, 5, 10).unwrap();
        assert_eq!(buf, (6..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_get_audio_before_start_is_silence() {
        let source = ramp(100);
        let mut buf = vec![0xFFu8; 10];
        source.get_audio(&mut buf, -4, 10).unwrap();
        assert_eq!(&buf[..4], &[0, 0, 0, 0]);
        assert_eq!(&buf[4..], &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_get_audio_past_end_is_silence() {
        let source = ramp(100);
        let mut buf = vec![0xFFu8; 10];
        source.get_audio(&mut buf, 95, 10).unwrap();
        assert_eq!(&buf[..5], &[96, 97, 98, 99, 100]);
        assert_eq!(&buf[5..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_get_audio_entirely_outside() {
        let source = ramp(100);
        let mut buf = vec![0xFFu8; 8];
        source.get_audio(&mut buf, -20, 8).unwrap();
        assert!(buf.iter().all(|&b| b == 0));

        let mut buf = vec![0xFFu8; 8];
        source.get_audio(&mut buf, 500, 8).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_get_audio_rejects_wrong_buffer() {
        let source = ramp(100);
        let mut buf = vec![0u8; 3];
        let err = source.get_audio(&mut buf, 0, 4).unwrap_err();
        assert!(matches!(
            err,
            AudioError::BufferSize {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_get_audio_non_positive_count() {
        let source = ramp(100);
        let mut buf = Vec::new();
        assert!(source.get_audio(&mut buf, 10, 0).is_ok());
        assert!(source.get_audio(&mut buf, 10, -5).is_ok());
    }

    #[test]
    fn test_direct_source_is_fully_decoded() {
        let source = ramp(100);
        assert_eq!(source.decoded_samples(), 100);
        assert_eq!(source.num_samples(), 100);
        assert_eq!(source.bytes_per_sample(), 1);
    }
}
