use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::UtcDateTime;

/// A persisted cache record describing one uniquely-content-addressed image.
///
/// Created only by the manager's insert path, never updated in place, never
/// deleted by this crate. Two records with equal `content_hash` would be the
/// same cached image; the lookup-before-insert protocol ensures only one of
/// them ever exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApodRecord {
    /// Assigned by SQLite on insert, always `>= 1`. There is no record `0`:
    /// lookups for a missing record return `None` instead.
    pub id: i64,
    /// Human-readable image title. May be empty.
    pub title: String,
    /// Free-form description. May be empty.
    pub explanation: String,
    /// Cache-relative path of the image file. Exists on disk for every
    /// committed record (file write strictly precedes the index insert).
    pub file_path: String,
    /// Lowercase-hex BLAKE3 digest of the image bytes. The dedup key.
    pub content_hash: String,
    /// When the record was inserted.
    pub created_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ApodRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) explanation: String,
    pub(crate) file_path: String,
    pub(crate) content_hash: String,
    pub(crate) created_at: i64,
}
impl TryFrom<ApodRow> for ApodRecord {
    type Error = Error;
    fn try_from(row: ApodRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            explanation: row.explanation,
            file_path: row.file_path,
            content_hash: row.content_hash,
            created_at: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("creation date"))?,
        })
    }
}
