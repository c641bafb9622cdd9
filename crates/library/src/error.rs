//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("failure talking to the cache index database")]
    Index,
    #[display("failure writing the image to the cache directory")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            // A locked index database or a transient filesystem error can
            // clear up; the caller loses nothing by trying again since the
            // add operation is idempotent.
            Self::Index | Self::Storage => true,
        }
    }
}
