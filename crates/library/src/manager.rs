use crate::error::{ErrorKind, Result};
use crate::{digest, namer};
use apod_cache::{ApodRecord, Repository};
use apod_storage::StoreHandle;
use exn::ResultExt;
use std::path::Path;
use time::Date;
use tracing::{debug, info, instrument};

// When a title normalizes away to nothing, this many leading digest
// characters stand in as the file stem.
const FALLBACK_STEM_LEN: usize = 16;

/// A downloaded image together with the metadata it was published under.
///
/// This is the hand-off type between whatever fetched the image (the NASA
/// API client, a test fixture) and [`CacheManager::add_to_cache`]. The bytes
/// are already fully in memory; images are a few megabytes at most.
#[derive(Debug, Clone)]
pub struct FetchedApod {
    /// The day this image was featured.
    pub date: Date,
    /// Raw image bytes as downloaded.
    pub bytes: Vec<u8>,
    /// Source URL, used only to derive the file extension.
    pub url: String,
    /// Human-readable title. May be empty.
    pub title: String,
    /// Free-form description. May be empty.
    pub explanation: String,
}

/// What [`CacheManager::add_to_cache`] did with the image it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    /// Identical bytes were already cached under this record id; nothing was
    /// written.
    Existing(i64),
    /// The image was new: its file was written and this record id assigned.
    Inserted(i64),
}

impl Added {
    /// The cache record id, however it was resolved.
    pub fn id(&self) -> i64 {
        match self {
            Self::Existing(id) | Self::Inserted(id) => *id,
        }
    }
}

/// Coordinator for the two halves of the cache: image files in a store and
/// records in the index database.
///
/// The manager owns the one ordering rule that keeps them consistent: an
/// index record is only ever inserted after its image file has been durably
/// written. A failure mid-operation can therefore leave an orphaned file
/// (harmless, overwritten on retry) but never a record pointing at nothing.
#[derive(Clone)]
pub struct CacheManager {
    store: StoreHandle,
    index: Repository,
}

impl CacheManager {
    pub fn new(store: StoreHandle, index: Repository) -> Self {
        Self { store, index }
    }

    /// Add a downloaded image to the cache, deduplicating by content.
    ///
    /// The image's digest is looked up in the index first; a hit returns the
    /// existing record id without touching the filesystem, no matter how the
    /// accompanying metadata differs from what was stored originally. Only
    /// genuinely new bytes get a file (named from title and URL, see
    /// [`namer`]) and an index record, in that order.
    #[instrument(skip_all, fields(date = %apod.date, title = %apod.title))]
    pub async fn add_to_cache(&self, apod: &FetchedApod) -> Result<Added> {
        let hash = digest::digest(&apod.bytes);
        if let Some(id) = self.index.find_id_by_hash(&hash).await.or_raise(|| ErrorKind::Index)? {
            debug!(id, "identical image already cached");
            return Ok(Added::Existing(id));
        }
        let mut name = namer::file_name(&apod.title, &apod.url);
        if name.starts_with('.') {
            // Title normalized away to nothing; a digest prefix keeps the
            // on-disk name from being extension-only.
            name.insert_str(0, &hash[..FALLBACK_STEM_LEN]);
        }
        self.store
            .write(Path::new(&name), &apod.bytes)
            .await
            .or_raise(|| ErrorKind::Storage)?;
        let id = self
            .index
            .insert(&apod.title, &apod.explanation, &name, &hash)
            .await
            .or_raise(|| ErrorKind::Index)?;
        info!(id, file = %name, "cached new image");
        Ok(Added::Inserted(id))
    }

    /// Look up a cache record by id. `None` when no such record exists,
    /// including for id `0`, which is never assigned.
    pub async fn get(&self, id: i64) -> Result<Option<ApodRecord>> {
        self.index.get(id).await.or_raise(|| ErrorKind::Index)
    }

    /// Every cached image title, for archive browsing.
    pub async fn titles(&self) -> Result<Vec<String>> {
        self.index.all_titles().await.or_raise(|| ErrorKind::Index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apod_cache::Database;
    use apod_storage::backend::MockStore;
    use apod_storage::error::{ErrorKind as StoreErrorKind, Result as StoreResult};
    use apod_storage::ImageStore;
    use std::sync::Arc;
    use time::macros::date;

    async fn make_manager(store: StoreHandle) -> CacheManager {
        let db = Database::connect_in_memory().await.unwrap();
        CacheManager::new(store, Repository::from(&db))
    }

    fn sample(bytes: &[u8]) -> FetchedApod {
        FetchedApod {
            date: date!(2022 - 05 - 22),
            bytes: bytes.to_vec(),
            url: "https://apod.nasa.gov/apod/image/2205/ngc3521.jpg".to_string(),
            title: " NGC #3521: Galaxy in a Bubble ".to_string(),
            explanation: "Gorgeous spiral galaxy NGC 3521 is a mere 35 million light-years away.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_new_image() {
        let store = Arc::new(MockStore::default());
        let manager = make_manager(store.clone()).await;

        let added = manager.add_to_cache(&sample(b"image-bytes")).await.unwrap();
        let Added::Inserted(id) = added else {
            panic!("fresh image should be inserted, got {added:?}");
        };

        let record = manager.get(id).await.unwrap().unwrap();
        assert_eq!(record.title, " NGC #3521: Galaxy in a Bubble ");
        assert_eq!(record.file_path, "NGC_3521_Galaxy_in_a_Bubble.jpg");
        assert_eq!(record.content_hash, digest::digest(b"image-bytes"));
        assert_eq!(store.read(Path::new(&record.file_path)).await.unwrap(), b"image-bytes");
    }

    #[tokio::test]
    async fn test_duplicate_bytes_are_not_recached() {
        let store = Arc::new(MockStore::default());
        let manager = make_manager(store.clone()).await;

        let first = manager.add_to_cache(&sample(b"same-bytes")).await.unwrap();

        // Same bytes under completely different metadata
        let mut repeat = sample(b"same-bytes");
        repeat.date = date!(2023 - 01 - 15);
        repeat.title = "A Repost With A New Name".to_string();
        repeat.url = "https://apod.nasa.gov/apod/image/2301/repost.png".to_string();
        let second = manager.add_to_cache(&repeat).await.unwrap();

        assert_eq!(second, Added::Existing(first.id()));
        assert_eq!(store.len().await, 1);
        assert_eq!(manager.titles().await.unwrap().len(), 1);
        // The original metadata stands
        let record = manager.get(first.id()).await.unwrap().unwrap();
        assert_eq!(record.file_path, "NGC_3521_Galaxy_in_a_Bubble.jpg");
    }

    #[tokio::test]
    async fn test_distinct_bytes_get_distinct_records() {
        let store = Arc::new(MockStore::default());
        let manager = make_manager(store.clone()).await;

        let first = manager.add_to_cache(&sample(b"bytes-one")).await.unwrap();
        let mut other = sample(b"bytes-two");
        other.title = "Tadpoles of IC 410".to_string();
        let second = manager.add_to_cache(&other).await.unwrap();

        assert!(matches!(second, Added::Inserted(_)));
        assert_ne!(first.id(), second.id());
        assert_eq!(store.len().await, 2);
        let mut titles = manager.titles().await.unwrap();
        titles.sort();
        assert_eq!(titles, [" NGC #3521: Galaxy in a Bubble ", "Tadpoles of IC 410"]);
    }

    #[tokio::test]
    async fn test_degenerate_title_gets_digest_stem() {
        let store = Arc::new(MockStore::default());
        let manager = make_manager(store).await;

        let mut apod = sample(b"mystery");
        apod.title = " ?!? ".to_string();
        let added = manager.add_to_cache(&apod).await.unwrap();

        let record = manager.get(added.id()).await.unwrap().unwrap();
        let expected_stem = &digest::digest(b"mystery")[..FALLBACK_STEM_LEN];
        assert_eq!(record.file_path, format!("{expected_stem}.jpg"));
    }

    /// A store whose writes always fail, for exercising the failure path.
    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait::async_trait]
    impl ImageStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        async fn exists(&self, _path: &Path) -> StoreResult<bool> {
            Ok(false)
        }
        async fn read(&self, path: &Path) -> StoreResult<Vec<u8>> {
            Err(exn::Exn::from(StoreErrorKind::NotFound(path.to_path_buf())))
        }
        async fn write(&self, _path: &Path, _data: &[u8]) -> StoreResult<()> {
            Err(exn::Exn::from(StoreErrorKind::Io(std::io::Error::other("disk on fire"))))
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_record() {
        let manager = make_manager(Arc::new(BrokenStore)).await;

        let err = manager.add_to_cache(&sample(b"doomed")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));

        // The index must not reference an image that was never written; the
        // same bytes still count as new on retry.
        assert!(manager.titles().await.unwrap().is_empty());
        let store = Arc::new(MockStore::default());
        let manager = CacheManager { store, index: manager.index.clone() };
        let added = manager.add_to_cache(&sample(b"doomed")).await.unwrap();
        assert!(matches!(added, Added::Inserted(_)));
    }
}
