//! Storage and File System Abstractions
//!
//! Provides the platform-agnostic file system contract used by the audio cache:
//! well-known directories for path-token resolution and the free-space query
//! that gates disk-backed caches.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// File system access trait
///
/// Abstracts the file system capabilities the core needs:
/// - Desktop: Direct filesystem access (`bridge-desktop`)
/// - Tests: `MockFileSystemAccess` (enable the `mock` feature)
///
/// The cache worker runs on a plain OS thread, so every method is synchronous.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// fn has_room(fs: &dyn FileSystemAccess, needed: u64) -> Result<bool> {
///     let dir = fs.temp_directory()?;
///     Ok(fs.free_space(&dir)? >= needed)
/// }
/// ```
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait FileSystemAccess: Send + Sync {
    /// Get the directory for short-lived temporary files (`?temp`)
    fn temp_directory(&self) -> Result<PathBuf>;

    /// Get the application's cache directory (`?local`)
    ///
    /// This directory is suitable for files that can be deleted
    /// by the system when storage is low.
    fn cache_directory(&self) -> Result<PathBuf>;

    /// Get the application's data directory (`?user` / `?data`)
    fn data_directory(&self) -> Result<PathBuf>;

    /// Create a directory and all parent directories if they don't exist
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Bytes available to the current user on the volume holding `path`
    fn free_space(&self, path: &Path) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_free_space() {
        let mut fs = MockFileSystemAccess::new();
        fs.expect_free_space()
            .withf(|path| path == Path::new("/cache"))
            .returning(|_| Ok(4096));

        assert_eq!(fs.free_space(Path::new("/cache")).unwrap(), 4096);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut fs = MockFileSystemAccess::new();
        fs.expect_temp_directory()
            .returning(|| Ok(PathBuf::from("/tmp")));

        let dynamic: &dyn FileSystemAccess = &fs;
        assert_eq!(dynamic.temp_directory().unwrap(), PathBuf::from("/tmp"));
    }
}
