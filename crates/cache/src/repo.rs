//! Repository for cache records in the index database.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{ApodRecord, ApodRow};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::debug;

/// Repository for managing cache records in the index database.
///
/// One row per distinct image content, keyed for lookup by the BLAKE3
/// `content_hash`. Deduplication is the caller's check-then-insert protocol:
/// call [`find_id_by_hash`](Self::find_id_by_hash) with the already-computed
/// digest of the candidate image, and only [`insert`](Self::insert) when it
/// returns `None`. That sequence is not atomic across concurrent callers —
/// two simultaneous additions of identical new content can both miss the
/// duplicate check. Accepted limitation for a single-user desktop tool.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Append a new cache record, returning its assigned id (always `>= 1`).
    ///
    /// The row is committed before this returns — no write-behind. A crash
    /// after `insert` returns must not lose the record.
    pub async fn insert(
        &self,
        title: impl AsRef<str>,
        explanation: impl AsRef<str>,
        file_path: impl AsRef<str>,
        content_hash: impl AsRef<str>,
    ) -> Result<i64> {
        let result = sqlx::query(include_str!("../queries/insert_apod.sql"))
            .bind(title.as_ref())
            .bind(explanation.as_ref())
            .bind(file_path.as_ref())
            .bind(content_hash.as_ref())
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let id = result.last_insert_rowid();
        debug!(id, hash = content_hash.as_ref(), "inserted cache record");
        Ok(id)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Get the id of the record with exactly this content hash, or `None`.
    ///
    /// An empty index returns `None` for any digest — a valid negative
    /// result, not an error.
    pub async fn find_id_by_hash(&self, content_hash: impl AsRef<str>) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar(include_str!("../queries/find_id_by_hash.sql"))
            .bind(content_hash.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(id)
    }

    /// Get the full record by id, or `None` if no such record exists.
    ///
    /// Id `0` is never assigned, so `get(0)` is always `None`.
    pub async fn get(&self, id: i64) -> Result<Option<ApodRecord>> {
        let row: Option<ApodRow> = sqlx::query_as(include_str!("../queries/get_by_id.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(ApodRecord::try_from).transpose()
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Every stored title, in no guaranteed order.
    ///
    /// Used by the archive-browsing collaborator to populate its picker.
    pub async fn all_titles(&self) -> Result<Vec<String>> {
        let titles: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_titles.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(titles)
    }
}
