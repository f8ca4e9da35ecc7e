//! # Audio Provider & Cache Module
//!
//! Provides the audio read surface used by the editor's waveform display and
//! playback, and the caches that sit in front of slow decoders.
//!
//! ## Overview
//!
//! This module handles:
//! - The [`AudioProvider`] trait every audio source implements
//! - A disk cache that decodes the whole stream ahead of the reader
//! - The memory-mapped temporary file backing that cache
//! - Picking a cache from the editor's configuration

pub mod cache;
pub mod cancellation;
pub mod error;
pub mod mapping;
pub mod provider;

pub use cache::{create_cache_provider, CacheProgress, HdAudioProvider, HdCacheOptions};
pub use cancellation::CancellationToken;
pub use error::{AudioError, MappingError, Result};
pub use mapping::TempFileMapping;
pub use provider::{AudioFormat, AudioProvider};
