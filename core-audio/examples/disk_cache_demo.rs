//! Disk cache demonstration
//!
//! Wraps a synthetic tone in the hard-disk cache and reports fill progress
//! while reading ahead of the worker.
//!
//! Run with:
//! ```bash
//! # Cache in the system temp directory
//! cargo run -p core-audio --example disk_cache_demo
//!
//! # Cache in a custom location, JSON logs
//! cargo run -p core-audio --example disk_cache_demo -- "?local/audio" json
//! ```

use bridge_desktop::DesktopFileSystem;
use bridge_traits::log::LogLevel;
use core_audio::{create_cache_provider, AudioFormat, AudioProvider, Result};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::AudioCacheConfig;
use std::env;
use std::time::Duration;
use tracing::info;

/// A 440 Hz 16-bit mono tone that takes a little time per request, like a
/// real decoder.
struct ToneSource {
    format: AudioFormat,
}

impl AudioProvider for ToneSource {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn fill_buffer(&self, buf: &mut [u8], start: u64, _count: u64) -> Result<()> {
        std::thread::sleep(Duration::from_millis(20));
        let rate = f64::from(self.format.sample_rate);
        for (i, frame) in buf.chunks_exact_mut(2).enumerate() {
            let t = (start + i as u64) as f64 / rate;
            let value = ((t * 440.0 * std::f64::consts::TAU).sin() * 12_000.0) as i16;
            frame.copy_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let location = args.get(1).cloned().unwrap_or_else(|| "default".to_string());
    let format = match args.get(2).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )
    .expect("Failed to initialize logging");

    let fs = DesktopFileSystem::new();
    let config = AudioCacheConfig::default().with_location(location);
    let source = ToneSource {
        format: AudioFormat::mono_16(48_000, 48_000 * 30),
    };

    let cache = create_cache_provider(Box::new(source), &config, &fs)
        .expect("Failed to create audio cache");
    info!(
        duration_secs = cache.format().duration().as_secs_f64(),
        "Opened cached tone"
    );

    let mut window = vec![0u8; 4800 * 2];
    loop {
        let decoded = cache.decoded_samples();
        cache
            .get_audio(&mut window, 300_000, 4800)
            .expect("Failed to read audio");
        let silent = window.iter().all(|&b| b == 0);
        info!(
            decoded,
            percent = decoded as f64 * 100.0 / cache.num_samples() as f64,
            silent,
            "Read 100ms at 6.25s"
        );

        if decoded == cache.num_samples() {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    info!("Cache complete, releasing");
}
