//! Locating a date's page in the public APOD archive listing.
//!
//! The archive is one large HTML page of links, one per published day, each
//! pointing at a page named `ap{YYMMDD}.html`. These helpers derive that page
//! name for a date and check whether the listing actually links to it, which
//! is how the viewer distinguishes "published that day" from "no feature".

use regex::Regex;
use std::sync::LazyLock;
use time::Date;

/// The full archive listing, linking every published day.
pub const ARCHIVE_URL: &str = "https://apod.nasa.gov/apod/archivepixFull.html";

const APOD_BASE_URL: &str = "https://apod.nasa.gov/apod/";

static ARCHIVE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<a href="(ap\d{6}\.html)">"#).unwrap());

/// Relative archive page name for a date, e.g. `ap220522.html` for
/// 2022-05-22. Years are two-digit, as the archive has always named them.
pub fn page_name(date: Date) -> String {
    format!("ap{:02}{:02}{:02}.html", date.year() % 100, u8::from(date.month()), date.day())
}

/// Absolute URL of a date's archive page.
pub fn page_url(date: Date) -> String {
    format!("{APOD_BASE_URL}{}", page_name(date))
}

/// Search the archive listing HTML for a link to the given date's page.
///
/// Returns the absolute page URL when the listing links to that day, `None`
/// when it does not (a date before the first feature, or one of the handful
/// of gap days with no entry).
pub fn find_page_link(html: &str, date: Date) -> Option<String> {
    let wanted = page_name(date);
    let found = ARCHIVE_LINK.captures_iter(html).any(|capture| &capture[1] == wanted.as_str());
    found.then(|| page_url(date))
}
