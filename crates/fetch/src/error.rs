//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("network failure talking to the NASA API")]
    Network,
    #[display("NASA API returned HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    #[display("NASA API response could not be understood")]
    InvalidResponse,
    /// The day's feature has no downloadable image, e.g. an interactive page.
    #[display("no image available for media type {_0:?}")]
    NotAnImage(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network => true,
            // 429 and 5xx clear up on their own; anything else is on us.
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::InvalidResponse | Self::NotAnImage(_) => false,
        }
    }
}
