//! Utility functions for URL validation and input handling.
//!
//! `validate_url` is the normalizer every worker runs before fetching.
//! `parse_url_list` turns the contents of a URL list file into raw jobs.

use crate::error::FetchHashError;
use url::{ParseError, Url};

/// Validate a raw URL string and give it an explicit scheme.
///
/// Rules, in order:
/// - empty input fails with "empty URL"
/// - control characters anywhere, or leading/trailing whitespace, fail with
///   "invalid URL"
/// - input the URL grammar cannot parse fails with "invalid URL"
/// - input without a scheme gets `http://` prepended
/// - a scheme other than `http` or `https` fails with "invalid URL"
/// - anything else is returned unchanged
///
/// # Example
///
/// ```rust
/// use myhttp_lib::validate_url;
///
/// assert_eq!(validate_url("example.com").unwrap(), "http://example.com");
/// assert_eq!(validate_url("https://example.com").unwrap(), "https://example.com");
/// assert!(validate_url("ftp://example.com").is_err());
/// ```
pub fn validate_url(raw: &str) -> Result<String, FetchHashError> {
    if raw.trim().is_empty() {
        return Err(FetchHashError::invalid_url(raw, "empty URL"));
    }

    // The URL parser strips these silently; the raw text would still carry them.
    if has_stray_characters(raw) {
        return Err(FetchHashError::invalid_url(raw, "invalid URL"));
    }

    match Url::parse(raw) {
        Ok(parsed) => {
            if is_allowed_scheme(parsed.scheme()) {
                Ok(raw.to_string())
            } else {
                Err(FetchHashError::invalid_url(raw, "invalid URL"))
            }
        }
        // No scheme: bare domains like "example.com" or "www.example.com/path"
        Err(ParseError::RelativeUrlWithoutBase) => {
            let with_scheme = format!("http://{}", raw);
            if has_stray_characters(&with_scheme) {
                return Err(FetchHashError::invalid_url(raw, "invalid URL"));
            }
            match Url::parse(&with_scheme) {
                Ok(_) => Ok(with_scheme),
                Err(_) => Err(FetchHashError::invalid_url(raw, "invalid URL")),
            }
        }
        Err(_) => Err(FetchHashError::invalid_url(raw, "invalid URL")),
    }
}

fn has_stray_characters(candidate: &str) -> bool {
    candidate.chars().any(char::is_control) || candidate.trim() != candidate
}

fn is_allowed_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

/// Extract raw URLs from the contents of a list file.
///
/// One URL per line. Blank lines and lines starting with `#` are skipped;
/// surrounding whitespace is trimmed. Inline `#` is kept since it may be a
/// URL fragment.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
