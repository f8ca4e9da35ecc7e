//! File System Access Implementation for desktop hosts

use bridge_traits::{
    error::{BridgeError, Result},
    storage::FileSystemAccess,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR_NAME: &str = "subtitle-editor";

/// Desktop file system implementation
///
/// Provides:
/// - `std::env::temp_dir` for `?temp`
/// - Platform-specific app directories from `dirs`
/// - Free-space queries through `fs2`
pub struct DesktopFileSystem {
    temp_dir: PathBuf,
    cache_dir: PathBuf,
    data_dir: PathBuf,
}

impl DesktopFileSystem {
    /// Create a new file system accessor with default directories
    pub fn new() -> Self {
        let temp_dir = std::env::temp_dir();

        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME);

        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join(APP_DIR_NAME);

        Self {
            temp_dir,
            cache_dir,
            data_dir,
        }
    }

    /// Create a new file system accessor with custom directories
    pub fn with_directories(temp_dir: PathBuf, cache_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            temp_dir,
            cache_dir,
            data_dir,
        }
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    fn ensure_dir(path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(Self::map_io_error)?;
            debug!(path = ?path, "Created directory");
        }
        Ok(path.to_path_buf())
    }
}

impl Default for DesktopFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemAccess for DesktopFileSystem {
    fn temp_directory(&self) -> Result<PathBuf> {
        Self::ensure_dir(&self.temp_dir)
    }

    fn cache_directory(&self) -> Result<PathBuf> {
        Self::ensure_dir(&self.cache_dir)
    }

    fn data_directory(&self) -> Result<PathBuf> {
        Self::ensure_dir(&self.data_dir)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    fn free_space(&self, path: &Path) -> Result<u64> {
        // A cache directory may not exist yet; its volume is the one holding
        // the nearest existing ancestor.
        let existing = path.ancestors().find(|p| p.exists()).ok_or_else(|| {
            BridgeError::OperationFailed(format!(
                "No existing directory to query free space for {}",
                path.display()
            ))
        })?;

        let available = fs2::available_space(existing).map_err(Self::map_io_error)?;
        debug!(path = ?existing, available, "Queried free space");
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_creation() {
        let fs = DesktopFileSystem::new();
        assert!(fs.temp_directory().is_ok());
    }

    #[test]
    fn test_custom_directories() {
        let root = tempfile::tempdir().unwrap();
        let temp = root.path().join("temp");
        let cache = root.path().join("cache");
        let data = root.path().join("data");
        let fs = DesktopFileSystem::with_directories(temp.clone(), cache.clone(), data.clone());

        assert_eq!(fs.temp_directory().unwrap(), temp);
        assert_eq!(fs.cache_directory().unwrap(), cache);
        assert_eq!(fs.data_directory().unwrap(), data);
        assert!(cache.is_dir());
    }

    #[test]
    fn test_free_space_of_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        let fs = DesktopFileSystem::new();

        assert!(fs.free_space(root.path()).is_ok());
    }

    #[test]
    fn test_free_space_of_missing_directory_uses_ancestor() {
        let root = tempfile::tempdir().unwrap();
        let fs = DesktopFileSystem::new();

        let missing = root.path().join("not").join("yet").join("created");
        let from_missing = fs.free_space(&missing).unwrap();
        let from_root = fs.free_space(root.path()).unwrap();

        // Same volume; allow for other processes writing in between.
        let delta = from_missing.abs_diff(from_root);
        assert!(delta < 64 * 1024 * 1024);
        assert!(!missing.exists());
    }

    #[test]
    fn test_create_dir_all() {
        let root = tempfile::tempdir().unwrap();
        let fs = DesktopFileSystem::new();
        let nested = root.path().join("a").join("b");

        fs.create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
