use crate::archive;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use time::Date;
use tracing::{debug, instrument};

/// One day's feature as described by the NASA APOD API.
///
/// Field names follow the API's JSON exactly. Not every feature is a plain
/// image: some days carry a video or an interactive page, which is why
/// [`image_url`](Self::image_url) can fail where the plain accessors cannot.
#[derive(Debug, Clone, Deserialize)]
pub struct ApodInfo {
    pub date: String,
    pub title: String,
    pub explanation: String,
    pub media_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub hdurl: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl ApodInfo {
    /// The URL of the downloadable image for this feature.
    ///
    /// Prefers the high-definition variant for images and falls back to the
    /// standard one; for videos the API-provided thumbnail stands in. Any
    /// other media type has nothing to cache and is an error.
    pub fn image_url(&self) -> Result<&str> {
        let url = match self.media_type.as_str() {
            "image" => self.hdurl.as_deref().or(self.url.as_deref()),
            "video" => self.thumbnail_url.as_deref(),
            _ => None,
        };
        url.ok_or_raise(|| ErrorKind::NotAnImage(self.media_type.clone()))
    }
}

/// HTTP client for the NASA APOD API and image downloads.
#[derive(Debug, Clone)]
pub struct ApodClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ApodClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().or_raise(|| ErrorKind::Network)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Fetch the metadata for the feature published on the given date.
    ///
    /// `thumbs` is always requested so that video features come back with a
    /// cacheable thumbnail URL.
    #[instrument(skip(self), fields(date = %date))]
    pub async fn get(&self, date: Date) -> Result<ApodInfo> {
        let date = format_date(date);
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("api_key", self.api_key.as_str()), ("date", &date), ("thumbs", "True")])
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        check_status(&response)?;
        response.json().await.or_raise(|| ErrorKind::InvalidResponse)
    }

    /// Download the complete contents of a URL into memory.
    ///
    /// APOD images top out at a few megabytes, so no streaming.
    #[instrument(skip(self))]
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await.or_raise(|| ErrorKind::Network)?;
        check_status(&response)?;
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Network)?;
        debug!(size = bytes.len(), "downloaded image");
        Ok(bytes.to_vec())
    }

    /// Check whether the public archive listing links to the given date,
    /// returning that page's URL if so.
    #[instrument(skip(self), fields(date = %date))]
    pub async fn find_archive_page(&self, date: Date) -> Result<Option<String>> {
        let response = self.http.get(archive::ARCHIVE_URL).send().await.or_raise(|| ErrorKind::Network)?;
        check_status(&response)?;
        let html = response.text().await.or_raise(|| ErrorKind::InvalidResponse)?;
        Ok(archive::find_page_link(&html, date))
    }
}

fn check_status(response: &Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        exn::bail!(ErrorKind::Status(status.as_u16()));
    }
    Ok(())
}

// The API takes dates as ISO 8601 calendar dates.
fn format_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}
