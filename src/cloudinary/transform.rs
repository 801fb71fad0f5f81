//! Delivery URL rewriting for Cloudinary-hosted images.
//!
//! Both functions are total: a URL that does not look like a Cloudinary
//! delivery URL passes through unchanged, and nothing here can fail.

use lazy_static::lazy_static;
use regex::Regex;

const HOST_MARKER: &str = "res.cloudinary.com";
const UPLOAD_MARKER: &str = "/image/upload/";

lazy_static! {
    /// Matches a path segment that already carries transformation
    /// directives (width/height/crop/quality/format/aspect-ratio).
    static ref DIRECTIVE_PREFIX: Regex =
        Regex::new(r"(^|,)(w_|h_|c_|q_|f_|ar_)").unwrap();
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub width: u32,
    pub height: u32,
    pub pad: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            width: 900,
            height: 1200,
            pad: true,
        }
    }
}

/// Insert a sizing directive right after the upload path marker.
///
/// Idempotent: when the first segment after the marker already carries
/// directives, the URL comes back untouched, so applying this twice is
/// the same as applying it once.
pub fn normalize_delivery_url(url: &str, options: &NormalizeOptions) -> String {
    if !url.contains(HOST_MARKER) {
        return url.to_string();
    }
    let (before, after) = match url.split_once(UPLOAD_MARKER) {
        Some(parts) => parts,
        None => return url.to_string(),
    };
    let first_segment = after.split('/').next().unwrap_or("");
    if DIRECTIVE_PREFIX.is_match(first_segment) {
        return url.to_string();
    }

    let transform = if options.pad {
        format!(
            "f_auto,q_auto,c_pad,b_white,w_{},h_{}",
            options.width, options.height
        )
    } else {
        format!("f_auto,q_auto,c_limit,w_{}", options.width)
    };
    format!("{}{}{}/{}", before, UPLOAD_MARKER, transform, after)
}

/// Insert a square fill-crop directive for thumbnail rendering.
///
/// Unlike [`normalize_delivery_url`] this carries no pre-existing
/// directive guard, inherited behavior from the system this replaces:
/// reapplying it stacks a second directive segment.
pub fn thumb_delivery_url(url: &str, size: u32) -> String {
    if !url.contains(HOST_MARKER) {
        return url.to_string();
    }
    let (before, after) = match url.split_once(UPLOAD_MARKER) {
        Some(parts) => parts,
        None => return url.to_string(),
    };
    format!(
        "{}{}f_auto,q_auto,c_fill,g_auto,w_{},h_{}/{}",
        before, UPLOAD_MARKER, size, size, after
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_URL: &str =
        "https://res.cloudinary.com/demo/image/upload/v1700000000/cardlist/abc123.jpg";

    fn normalize(url: &str) -> String {
        normalize_delivery_url(url, &NormalizeOptions::default())
    }

    #[test]
    fn normalize_inserts_pad_directive_after_marker() {
        assert_eq!(
            normalize(PLAIN_URL),
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto,c_pad,b_white,w_900,h_1200/v1700000000/cardlist/abc123.jpg"
        );
    }

    #[test]
    fn normalize_limit_mode_has_no_height_directive() {
        let options = NormalizeOptions {
            width: 600,
            height: 800,
            pad: false,
        };
        assert_eq!(
            normalize_delivery_url(PLAIN_URL, &options),
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto,c_limit,w_600/v1700000000/cardlist/abc123.jpg"
        );
    }

    #[test]
    fn unrecognized_urls_pass_through_unchanged() {
        for url in [
            "",
            "https://example.com/image/upload/foo.jpg",
            "https://res.cloudinary.com/demo/raw/other/foo.jpg",
            "https://res.cloudinary.com/demo/image/upload",
            "not a url at all",
        ] {
            assert_eq!(normalize(url), url);
            assert_eq!(thumb_delivery_url(url, 80), url);
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize(PLAIN_URL);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_skips_urls_with_existing_directives() {
        for segment in ["w_100", "h_50,c_fill", "q_auto", "f_auto", "ar_4:3", "x_1,c_pad"] {
            let url = format!(
                "https://res.cloudinary.com/demo/image/upload/{}/v1/abc.jpg",
                segment
            );
            assert_eq!(normalize(&url), url, "segment {:?}", segment);
        }
    }

    #[test]
    fn normalize_does_not_skip_unrelated_first_segments() {
        // A version segment is not a directive; the transform applies.
        let normalized = normalize(PLAIN_URL);
        assert!(normalized.contains("/image/upload/f_auto,"));
    }

    #[test]
    fn thumb_inserts_square_fill_crop() {
        assert_eq!(
            thumb_delivery_url(PLAIN_URL, 80),
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto,c_fill,g_auto,w_80,h_80/v1700000000/cardlist/abc123.jpg"
        );
    }

    #[test]
    fn thumb_stacks_when_reapplied() {
        // No directive guard on the thumbnail path; the second call adds
        // a second segment instead of returning the input.
        let once = thumb_delivery_url(PLAIN_URL, 80);
        let twice = thumb_delivery_url(&once, 80);
        assert_ne!(once, twice);
    }
}
