//! In-memory image store for testing.

use crate::ImageStore;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// In-memory image store for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Ideal for unit
/// tests that need an [`ImageStore`] without touching the filesystem.
///
/// # Examples
///
/// ```
/// use apod_storage::backend::MockStore;
/// use apod_storage::ImageStore;
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_files([
///     ("Tadpoles2048original.png", b"fake png bytes"),
/// ]);
/// assert!(store.exists(Path::new("Tadpoles2048original.png")).await?);
///
/// store.write(Path::new("Horsehead.jpg"), b"more bytes").await?;
/// assert!(store.exists(Path::new("Horsehead.jpg")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    storage: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MockStore {
    /// Create a mock store pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then the test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockStore is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockStore::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
        }
    }

    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of files currently held.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Returns `true` if no files are held.
    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }
}
impl Default for MockStore {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl ImageStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let data =
            self.storage.read().await.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))?;
        Ok(data)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.insert(path, data.to_vec());
        Ok(())
    }
}
