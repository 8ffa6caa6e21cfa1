//! Capture and lookup of HTTP response header lines.

use std::str;

/// Header lines of the last response seen on a transfer.
///
/// libcurl calls the header callback for every response on the way,
/// including redirects and `100 Continue`. A new status line discards what
/// was collected so far, so after `perform` only the final response remains.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    lines: Vec<String>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw header callback chunk.
    pub fn push_raw(&mut self, data: &[u8]) {
        let Ok(s) = str::from_utf8(data) else {
            return;
        };
        let line = s.trim_end();
        if line.starts_with("HTTP/") {
            self.lines.clear();
        }
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
    }

    /// First value of header `name` (case-insensitive), trimmed.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}
