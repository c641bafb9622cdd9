//! Local filesystem image store.
//!
//! Cached images are plain files in a configured directory, accessed via
//! `tokio::fs` for async I/O. The directory doubles as the home of the SQLite
//! index file, so creating it on construction covers cache initialization for
//! the whole process.

use crate::error::ErrorKind;
use crate::{ImageStore, error::Result, path::validate as validate_path};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Image store backed by a directory on the local filesystem.
///
/// All paths are relative to the configured root directory. Constructing a
/// `LocalStore` is idempotent cache initialization: the root is created if
/// absent and left alone otherwise.
///
/// # Examples
///
/// ```no_run
/// use apod_storage::backend::LocalStore;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalStore::new("images", "/absolute/path/to/cache")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalStore {
    name: String,
    /// Root directory of the image cache
    root: PathBuf,
}
impl LocalStore {
    /// Create a new local image store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or if it exists and is
    /// not a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }

        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it'll only happen once on cache
            // initialization and it's not worth the hassle of making the
            // constructor async.
            debug!(root = %root.display(), "creating image cache directory");
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }

        Ok(Self { name: name.into(), root })
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a cache-relative path.
    ///
    /// Validates the path and joins it with the root directory. This is what
    /// the desktop-background collaborator needs: the store hands out the
    /// full path and makes no OS call itself.
    pub fn absolute(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl ImageStore for LocalStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        // Explicit create/write/sync instead of fs::write: the index row that
        // follows a write must never point at bytes still sitting in a kernel
        // buffer when the power goes out.
        let mut file = fs::File::create(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        file.write_all(data).await.map_err(|e| Self::map_io_error(e, path))?;
        file.sync_all().await.map_err(|e| Self::map_io_error(e, path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalStore::new("images", temp_dir.path()).is_ok());
        assert!(LocalStore::new("images", "relative/path").is_err());
        assert!(LocalStore::new("images", "./relative").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("cache");
        assert!(!root.exists());
        LocalStore::new("images", &root).unwrap();
        assert!(root.is_dir());
        // Idempotent: constructing again over the existing directory is fine
        LocalStore::new("images", &root).unwrap();
    }

    #[test]
    fn test_new_rejects_non_directory_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, b"oops").unwrap();
        assert!(LocalStore::new("images", &file).is_err());
    }

    #[test]
    fn test_absolute() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("images", temp_dir.path()).unwrap();
        let expected = temp_dir.path().join("Horsehead_Nebula.jpg");
        assert_eq!(store.absolute(Path::new("Horsehead_Nebula.jpg")).unwrap(), expected);
        // Path traversal is prevented
        assert!(store.absolute(Path::new("../etc/passwd")).is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("images", temp_dir.path()).unwrap();
        let data = b"\x89PNG\r\n\x1a\n fake image bytes";
        store.write(Path::new("apod.png"), data).await.unwrap();
        let read_data = store.read(Path::new("apod.png")).await.unwrap();
        assert_eq!(read_data, data);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("images", temp_dir.path()).unwrap();
        store.write(Path::new("apod.png"), b"first").await.unwrap();
        store.write(Path::new("apod.png"), b"second").await.unwrap();
        assert_eq!(store.read(Path::new("apod.png")).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("images", temp_dir.path()).unwrap();
        store.write(Path::new("2024/02/apod.png"), b"data").await.unwrap();
        assert!(store.exists(Path::new("2024/02/apod.png")).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("images", temp_dir.path()).unwrap();
        assert!(!store.exists(Path::new("nonexistent.png")).await.unwrap());
        store.write(Path::new("exists.png"), b"data").await.unwrap();
        assert!(store.exists(Path::new("exists.png")).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("images", temp_dir.path()).unwrap();
        let err = store.read(Path::new("missing.png")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new("images", temp_dir.path()).unwrap();
        // Attempts to escape the root should fail
        assert!(store.read(Path::new("../etc/passwd")).await.is_err());
        assert!(store.read(Path::new("etc/../../passwd")).await.is_err());
        assert!(store.write(Path::new("../etc/passwd"), b"data").await.is_err());
    }
}
