//! Resumable upload session initiation.

use url::Url;

use crate::error::{RelayError, SessionInitFailure};
use crate::http::{self, HttpOptions, ResponseHeaders};

/// Google Drive v3 media upload endpoint.
pub const DEFAULT_INIT_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// Longest response body excerpt kept in a [`SessionInitFailure::Status`].
const BODY_EXCERPT: usize = 512;

/// The storage API's upload-creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadApi {
    init_endpoint: String,
    http: HttpOptions,
}

impl Default for UploadApi {
    fn default() -> Self {
        Self::new(DEFAULT_INIT_ENDPOINT)
    }
}

impl UploadApi {
    pub fn new(init_endpoint: impl Into<String>) -> Self {
        UploadApi {
            init_endpoint: init_endpoint.into(),
            http: HttpOptions::default(),
        }
    }

    pub fn http_options(mut self, opts: HttpOptions) -> Self {
        self.http = opts;
        self
    }

    pub fn init_endpoint(&self) -> &str {
        &self.init_endpoint
    }

    pub(crate) fn http(&self) -> &HttpOptions {
        &self.http
    }

    /// `<init_endpoint>?uploadType=resumable`, keeping any query already there.
    pub fn initiation_url(&self) -> Result<Url, RelayError> {
        let mut url = Url::parse(&self.init_endpoint).map_err(|e| RelayError::InvalidUrl {
            url: self.init_endpoint.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("uploadType", "resumable");
        Ok(url)
    }

    /// Sends the initiation request and returns the session endpoint from
    /// the `Location` header. Only HTTP 200 counts as success; nothing is
    /// retried here.
    pub fn open(&self, token: &str, remote_name: &str, total_size: u64) -> Result<String, RelayError> {
        let url = self.initiation_url()?;
        let body = metadata_body(remote_name);
        let auth = format!("Bearer {token}");
        let length = total_size.to_string();

        let (code, headers, response) = post_json(&url, &self.http, &body, &auth, &length)
            .map_err(|e| {
                tracing::warn!(url = %url, "upload session request failed: {}", e);
                RelayError::SessionInit(SessionInitFailure::Curl(e))
            })?;

        if code != 200 {
            let mut excerpt = String::from_utf8_lossy(&response).into_owned();
            if excerpt.len() > BODY_EXCERPT {
                let mut cut = BODY_EXCERPT;
                while !excerpt.is_char_boundary(cut) {
                    cut -= 1;
                }
                excerpt.truncate(cut);
            }
            tracing::warn!(url = %url, "upload session init returned HTTP {}", code);
            return Err(RelayError::SessionInit(SessionInitFailure::Status {
                code,
                body: excerpt,
            }));
        }

        let Some(location) = headers.get("location") else {
            tracing::warn!(url = %url, "upload session init returned no Location");
            return Err(RelayError::SessionInit(SessionInitFailure::MissingLocation));
        };

        tracing::info!(name = remote_name, total_size, "upload session opened");
        Ok(location.to_string())
    }
}

/// `{"name": "<remote_name>"}` with a space after the colon and non-ASCII
/// characters escaped as `\uXXXX`.
fn metadata_body(remote_name: &str) -> String {
    let quoted = serde_json::Value::String(remote_name.to_string()).to_string();
    let mut escaped = String::with_capacity(quoted.len());
    for c in quoted.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    format!("{{\"name\": {}}}", escaped)
}

fn post_json(
    url: &Url,
    opts: &HttpOptions,
    body: &str,
    auth: &str,
    length: &str,
) -> Result<(u32, ResponseHeaders, Vec<u8>), curl::Error> {
    let mut easy = http::easy_for(url.as_str(), opts)?;
    easy.post(true)?;
    easy.post_fields_copy(body.as_bytes())?;
    easy.http_headers(http::header_list(&[
        ("Authorization", auth),
        ("Content-Type", "application/json"),
        ("X-Upload-Content-Length", length),
        ("Expect", ""),
    ])?)?;

    let mut headers = ResponseHeaders::new();
    let mut response = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            headers.push_raw(data);
            true
        })?;
        transfer.write_function(|data| {
            response.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    Ok((code, headers, response))
}
