//! Shared libcurl plumbing for the fetch and upload stages.
//!
//! Every request is a blocking `curl::easy::Easy` transfer; call from
//! `spawn_blocking` if used from async code.

mod headers;

pub use headers::ResponseHeaders;

use std::time::Duration;

/// Knobs applied to every easy handle. With the defaults nothing is set and
/// libcurl's own defaults apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Option<Duration>,
}

/// New easy handle pointed at `url` with `opts` applied.
pub(crate) fn easy_for(url: &str, opts: &HttpOptions) -> Result<curl::easy::Easy, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    if let Some(t) = opts.connect_timeout {
        easy.connect_timeout(t)?;
    }
    Ok(easy)
}

/// Builds a curl header list from `Name: value` pairs. An empty value
/// becomes `Name:`, which tells libcurl to drop a header it would add itself.
pub(crate) fn header_list(pairs: &[(&str, &str)]) -> Result<curl::easy::List, curl::Error> {
    let mut list = curl::easy::List::new();
    for (k, v) in pairs {
        let v = v.trim();
        if v.is_empty() {
            list.append(&format!("{}:", k.trim()))?;
        } else {
            list.append(&format!("{}: {}", k.trim(), v))?;
        }
    }
    Ok(list)
}
