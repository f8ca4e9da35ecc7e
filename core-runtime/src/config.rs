//! # Audio Cache Configuration
//!
//! Provides the options that decide whether opened audio is cached and where
//! the disk cache lives.
//!
//! ## Overview
//!
//! `AudioCacheConfig` is built with `with_*` methods or loaded from the
//! editor's JSON options, then checked with [`AudioCacheConfig::validate`].
//! The cache location may use path tokens which are decoded against the host's
//! [`FileSystemAccess`] bridge:
//!
//! | Token     | Directory                          |
//! |-----------|------------------------------------|
//! | `?temp`   | `FileSystemAccess::temp_directory` |
//! | `?local`  | `FileSystemAccess::cache_directory`|
//! | `?user`   | `FileSystemAccess::data_directory` |
//! | `?data`   | `FileSystemAccess::data_directory` |
//!
//! The literal location `"default"` means `?temp`, and relative locations are
//! made absolute against `?temp`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{AudioCacheConfig, CacheType};
//!
//! let config = AudioCacheConfig::from_json(r#"{ "type": "disk", "location": "?local/audio" }"#)?;
//! let dir = config.resolve_cache_dir(&fs)?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::FileSystemAccess;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location value that selects the platform temp directory.
pub const DEFAULT_LOCATION: &str = "default";

/// Samples decoded per worker iteration unless configured otherwise.
pub const DEFAULT_BLOCK_SAMPLES: u64 = 65_536;

/// Which cache, if any, wraps newly opened audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Read straight from the decoder.
    None,
    /// Decode the whole stream in the background into a temporary file.
    #[default]
    Disk,
}

/// Configuration for the audio cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioCacheConfig {
    /// Cache implementation to use (default: disk)
    #[serde(rename = "type")]
    pub cache_type: CacheType,

    /// Directory for disk cache files, may start with a path token (default: "default")
    pub location: String,

    /// Samples decoded and committed per worker iteration (default: 65536)
    pub block_samples: u64,
}

impl Default for AudioCacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Disk,
            location: DEFAULT_LOCATION.to_string(),
            block_samples: DEFAULT_BLOCK_SAMPLES,
        }
    }
}

impl AudioCacheConfig {
    /// Create a new cache configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid audio cache options: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("Failed to serialize audio cache options: {}", e)))
    }

    /// Set the cache type.
    pub fn with_cache_type(mut self, cache_type: CacheType) -> Self {
        self.cache_type = cache_type;
        self
    }

    /// Set the cache location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the worker block size in samples.
    pub fn with_block_samples(mut self, samples: u64) -> Self {
        self.block_samples = samples;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.block_samples == 0 {
            return Err(Error::Config(
                "block_samples must be greater than 0".to_string(),
            ));
        }

        if self.location.trim().is_empty() {
            return Err(Error::Config("location cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Resolve the configured location to an absolute cache directory.
    ///
    /// The directory is not created here.
    pub fn resolve_cache_dir(&self, fs: &dyn FileSystemAccess) -> Result<PathBuf> {
        self.validate()?;

        let location = if self.location == DEFAULT_LOCATION {
            "?temp"
        } else {
            self.location.as_str()
        };

        let decoded = decode_path(location, fs)?;
        if decoded.is_absolute() {
            Ok(decoded)
        } else {
            Ok(fs.temp_directory()?.join(decoded))
        }
    }
}

/// Expand a leading path token, if any.
fn decode_path(location: &str, fs: &dyn FileSystemAccess) -> Result<PathBuf> {
    if !location.starts_with('?') {
        return Ok(PathBuf::from(location));
    }

    let split = location.find(['/', '\\']).unwrap_or(location.len());
    let (token, rest) = location.split_at(split);
    let rest = rest.trim_start_matches(['/', '\\']);

    let base = match token {
        "?temp" => fs.temp_directory()?,
        "?local" => fs.cache_directory()?,
        "?user" | "?data" => fs.data_directory()?,
        other => {
            return Err(Error::Config(format!(
                "Unknown path token '{}' in cache location '{}'",
                other, location
            )))
        }
    };

    if rest.is_empty() {
        Ok(base)
    } else {
        Ok(base.join(Path::new(rest)))
    }
}
