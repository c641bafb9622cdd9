//! Filesystem names derived from image metadata.
//!
//! Cached images are saved under a name built from the human-readable title
//! and the source URL's extension, so a user browsing the cache directory
//! sees `NGC_3521_Galaxy_in_a_Bubble.jpg` rather than an opaque hash. The
//! derivation is lossy and two titles can collide; identity lives in the
//! index database's content hash, never in the file name.

/// Derive a file name from an image title and its source URL.
///
/// The name is `{title}.{ext}` where the title has been normalized for
/// filesystem use (see [`normalize_title`]) and the extension is taken from
/// the URL (see [`extension`]). Either half may come out empty; callers that
/// need a non-empty stem should substitute their own (the cache manager
/// falls back to a digest prefix).
pub fn file_name(title: &str, url: &str) -> String {
    format!("{}.{}", normalize_title(title), extension(url))
}

/// Normalize a title into a filesystem-friendly stem.
///
/// Leading and trailing whitespace is dropped, each internal run of
/// whitespace becomes a single underscore, and every remaining character
/// that is neither Unicode-alphanumeric nor an underscore is removed.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// The extension of a URL: everything after the last `.`, or, for URLs with
/// no dot at all, everything after the last `/` (possibly empty).
pub fn extension(url: &str) -> &str {
    match url.rfind('.') {
        Some(index) => &url[index + 1..],
        None => url.rsplit('/').next().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_worked_example() {
        assert_eq!(
            file_name(" NGC #3521: Galaxy in a Bubble ", "https://apod.nasa.gov/apod/image/2205/ngc3521.jpg"),
            "NGC_3521_Galaxy_in_a_Bubble.jpg",
        );
    }

    #[rstest]
    #[case("Simple Title", "Simple_Title")]
    #[case("  padded  ", "padded")]
    #[case("tabs\tand\nnewlines", "tabs_and_newlines")]
    #[case("multi   space", "multi_space")]
    #[case("semi;colon's", "semicolons")]
    #[case("under_score kept", "under_score_kept")]
    #[case("Comet 67P/Churyumov–Gerasimenko", "Comet_67PChuryumovGerasimenko")]
    #[case("../../etc passwd", "etc_passwd")]
    #[case("back\\slash", "backslash")]
    #[case("bell\u{7}s and null\u{0}s", "bells_and_nulls")]
    #[case("ηCarinae über Sterne", "ηCarinae_über_Sterne")]
    #[case("!!!", "")]
    #[case("", "")]
    fn test_normalize_title(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(normalize_title(title), expected);
    }

    #[rstest]
    #[case("https://example.com/image.png", "png")]
    #[case("https://example.com/archive.tar.gz", "gz")]
    #[case("https://example.com/image.PNG?size=full", "PNG?size=full")]
    #[case("https://example-com/path/to/frame", "frame")]
    #[case("https://example-com/trailing/", "")]
    #[case("", "")]
    fn test_extension(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(extension(url), expected);
    }

    #[test]
    fn test_degenerate_title_leaves_empty_stem() {
        // The stem can normalize away entirely; the caller decides what to
        // substitute, not this module.
        assert_eq!(file_name("???", "https://example.com/x.gif"), ".gif");
    }
}
