//! Remote filename derivation from a URL path.

use url::Url;

/// Last path segment of `url`, taken verbatim (still percent-encoded).
///
/// Root paths, paths ending in `/` and URLs without a hierarchical path
/// (e.g. `data:`) yield an empty string. Query and fragment never count.
pub fn remote_basename(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .to_string()
}

/// Parses `raw` and returns its basename, or `None` if it is not a URL.
pub fn basename_of(raw: &str) -> Option<String> {
    Url::parse(raw).ok().map(|u| remote_basename(&u))
}
