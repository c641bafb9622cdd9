//! Image store trait and implementations.
//!
//! This module defines the `ImageStore` trait, which is the seam between the
//! cache manager and whatever actually holds the image bytes (a directory on
//! disk in production, a `HashMap` in tests).

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalStore;
#[cfg(feature = "mock")]
pub use self::mock::MockStore;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Binary file storage for cached images.
///
/// All paths are relative to the store's root and must pass
/// [`validate_path`](crate::validate_path) — implementations enforce this, so
/// an image title that smuggles in `../` can never write outside the cache.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use apod_storage::{ImageStore, error::Result};
///
/// async fn size_of_cached_image(store: &dyn ImageStore) -> Result<u64> {
///     let path = Path::new("Tadpoles2048original.png");
///     if store.exists(path).await? {
///         let data = store.read(path).await?;
///         Ok(data.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read complete file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents durably.
    ///
    /// Creates a new file or overwrites an existing one (last-writer-wins; no
    /// advisory locking). Implementations create parent directories as needed
    /// and flush to stable storage before returning.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
