//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `FileSystemAccess` using `std::fs`, `dirs` for well-known directories and
//!   `fs2` for free-space queries
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::DesktopFileSystem;
//! use bridge_traits::FileSystemAccess;
//!
//! let fs = DesktopFileSystem::new();
//! let temp = fs.temp_directory()?;
//! println!("{} bytes free", fs.free_space(&temp)?);
//! ```

mod filesystem;

pub use filesystem::DesktopFileSystem;
