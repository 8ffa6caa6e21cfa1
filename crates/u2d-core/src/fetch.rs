//! Source download: one GET (following redirects) streamed into a new
//! temporary file.
//!
//! The remote name is taken from the URL the response finally came from,
//! not the one requested, so a redirect to `/files/report.pdf` names the
//! upload `report.pdf`.

use std::cell::OnceCell;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use url::Url;

use crate::checksum::BodyDigest;
use crate::error::{RelayError, TransferFailure};
use crate::http::{self, HttpOptions};
use crate::url_model::remote_basename;

const TEMP_PREFIX: &str = "u2d-";
const MAX_REDIRECTS: u32 = 10;

/// Outcome of a successful fetch. The caller owns `local_path` and is
/// responsible for deleting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub local_path: PathBuf,
    /// Last path segment of the final URL; may be empty.
    pub remote_basename: String,
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the body.
    pub sha256: String,
}

/// Downloads `url` into a new temp file in the system temp directory.
pub fn fetch(url: &str) -> Result<FetchResult, RelayError> {
    Fetcher::new(url).fetch()
}

/// A URL plus what was learned by fetching it.
///
/// `response_url` and `remote_basename` only exist after [`Fetcher::fetch`]
/// succeeded; reading them earlier returns [`RelayError::NotFetched`].
#[derive(Debug, Clone)]
pub struct Fetcher {
    url: String,
    download_dir: Option<PathBuf>,
    http: HttpOptions,
    response_url: Option<Url>,
    basename: OnceCell<String>,
}

impl Fetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Fetcher {
            url: url.into(),
            download_dir: None,
            http: HttpOptions::default(),
            response_url: None,
            basename: OnceCell::new(),
        }
    }

    /// Create the temp file in `dir` instead of the system temp directory.
    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    pub fn http_options(mut self, opts: HttpOptions) -> Self {
        self.http = opts;
        self
    }

    /// The URL as requested.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL the response came from after redirects.
    pub fn response_url(&self) -> Result<&Url, RelayError> {
        self.response_url.as_ref().ok_or(RelayError::NotFetched {
            what: "response URL",
        })
    }

    /// Remote filename, derived from [`Fetcher::response_url`] on first use.
    pub fn remote_basename(&self) -> Result<&str, RelayError> {
        let url = self.response_url()?;
        Ok(self.basename.get_or_init(|| remote_basename(url)))
    }

    /// Streams the resource into a new local file.
    ///
    /// On error no file is left behind.
    pub fn fetch(&mut self) -> Result<FetchResult, RelayError> {
        let requested = Url::parse(&self.url).map_err(|e| {
            tracing::warn!(url = %self.url, "malformed URL: {}", e);
            RelayError::InvalidUrl {
                url: self.url.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut temp = self.create_temp()?;
        let mut digest = BodyDigest::new();
        let final_url = self.download_into(&requested, temp.as_file_mut(), &mut digest)?;

        let (_, local_path) = temp
            .keep()
            .map_err(|e| RelayError::io(e.file.path().to_path_buf(), e.error))?;

        let bytes = digest.len();
        let sha256 = digest.finish();
        tracing::info!(
            url = %self.url,
            final_url = %final_url,
            path = %local_path.display(),
            bytes,
            "fetched"
        );

        self.response_url = Some(final_url);
        self.basename = OnceCell::new();
        let remote_basename = self.remote_basename()?.to_string();

        Ok(FetchResult {
            local_path,
            remote_basename,
            bytes,
            sha256,
        })
    }

    fn create_temp(&self) -> Result<NamedTempFile, RelayError> {
        let dir = self
            .download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&dir)
            .map_err(|e| RelayError::io(dir, e))
    }

    /// Runs the GET, writing the body to `file`. Returns the effective URL.
    fn download_into(
        &self,
        requested: &Url,
        file: &mut File,
        digest: &mut BodyDigest,
    ) -> Result<Url, RelayError> {
        let curl_err = |e: curl::Error| self.curl_failure(e);

        let mut easy = http::easy_for(requested.as_str(), &self.http).map_err(curl_err)?;
        easy.follow_location(true).map_err(curl_err)?;
        easy.max_redirections(MAX_REDIRECTS).map_err(curl_err)?;

        let mut storage_error: Option<io::Error> = None;
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    digest.update(data);
                    Ok(data.len())
                }
                Err(e) => {
                    storage_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(curl_err)?;
        let performed = transfer.perform();
        drop(transfer);

        if let Err(e) = performed {
            if e.is_write_error() {
                if let Some(io_err) = storage_error.take() {
                    tracing::warn!(url = %self.url, "writing fetched body failed: {}", io_err);
                    return Err(self.transfer_error(TransferFailure::Storage(io_err)));
                }
            }
            return Err(curl_err(e));
        }

        let effective = easy
            .effective_url()
            .map_err(curl_err)?
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| requested.clone());

        let code = easy.response_code().map_err(curl_err)?;
        let is_http = matches!(effective.scheme(), "http" | "https");
        if is_http && !(200..300).contains(&code) {
            tracing::warn!(url = %self.url, final_url = %effective, "GET returned HTTP {}", code);
            return Err(self.transfer_error(TransferFailure::Status(code)));
        }

        Ok(effective)
    }

    fn curl_failure(&self, e: curl::Error) -> RelayError {
        if e.is_url_malformed() || e.is_unsupported_protocol() {
            tracing::warn!(url = %self.url, "URL rejected by transport: {}", e);
            return RelayError::InvalidUrl {
                url: self.url.clone(),
                reason: e.to_string(),
            };
        }
        tracing::warn!(url = %self.url, "GET failed: {}", e);
        self.transfer_error(TransferFailure::Curl(e))
    }

    fn transfer_error(&self, source: TransferFailure) -> RelayError {
        RelayError::Transfer {
            url: self.url.clone(),
            source,
        }
    }
}

/// Removes a fetched file, logging instead of failing when it is already gone.
pub fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed local copy"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not remove local copy: {}", e),
    }
}
