//! Client for NASA's Astronomy Picture of the Day API.
//!
//! Covers the three remote interactions the cache needs: fetching a day's
//! metadata, downloading the image itself, and checking the public archive
//! listing for a day's page.

pub mod archive;
mod client;
pub mod error;

pub use crate::client::{ApodClient, ApodInfo};
