//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-audio`, `core-runtime`, `bridge-desktop`).
//! Host applications can depend on `subcache-workspace` and enable the documented
//! features without needing to wire each crate individually.

#[cfg(feature = "disk-cache")]
pub use core_audio;
#[cfg(feature = "disk-cache")]
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
