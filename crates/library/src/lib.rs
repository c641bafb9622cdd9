//! Core logic of the astronomy-image cache: content hashing, file naming,
//! and the manager that keeps the image directory and index database in step.

pub mod digest;
pub mod error;
mod manager;
pub mod namer;

pub use crate::manager::{Added, CacheManager, FetchedApod};
