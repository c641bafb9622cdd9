//! SQLite index database for the image cache.
//!
//! This crate provides the durable index that tracks every cached image. A
//! record stores the image's title, explanation, file path and BLAKE3
//! content hash; the hash is the deduplication key. The image files
//! themselves live next to the database in the cache directory and are
//! handled by `apod-storage`.
//!
//! Records are append-only. Deleting images is an external administrative
//! action on the directory and the index independently, which may
//! desynchronize them — known risk, not handled here.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::ApodRecord;
pub use crate::repo::Repository;
