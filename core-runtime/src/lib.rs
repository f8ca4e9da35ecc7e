//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the editor core:
//! - Logging and tracing infrastructure
//! - Audio cache configuration and cache-directory resolution
//!
//! ## Overview
//!
//! This crate contains the core runtime utilities that other modules depend on.
//! It establishes the logging conventions and the configuration surface used
//! throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AudioCacheConfig, CacheType};
pub use error::{Error, Result};
