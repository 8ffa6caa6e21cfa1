//! Fetch-then-upload in one call.

use std::path::PathBuf;

use crate::error::RelayError;
use crate::fetch::{FetchResult, Fetcher};
use crate::http::HttpOptions;
use crate::upload::{UploadApi, UploadDriver, UploadOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub fetch: FetchResult,
    pub upload: UploadOutcome,
}

/// How a relay reaches both ends.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub api: UploadApi,
    pub chunk_size: u64,
    pub download_dir: Option<PathBuf>,
    pub http: HttpOptions,
}

impl Default for RelayOptions {
    fn default() -> Self {
        RelayOptions {
            api: UploadApi::default(),
            chunk_size: crate::chunk::DEFAULT_CHUNK_SIZE,
            download_dir: None,
            http: HttpOptions::default(),
        }
    }
}

/// Saves the file at `url` to Drive using `token`, with default options.
pub fn drive_it(url: &str, token: &str) -> Result<RelayOutcome, RelayError> {
    relay(url, token, &RelayOptions::default())
}

/// Fetches `url` and uploads the local copy under its remote basename.
///
/// The local copy is kept and returned in the outcome; the caller decides
/// when to remove it. If the upload fails the local copy is left in place
/// too, so a retry can skip the download.
pub fn relay(url: &str, token: &str, opts: &RelayOptions) -> Result<RelayOutcome, RelayError> {
    let fetch = fetch_with(url, opts)?;
    let upload = upload_fetched(&fetch, token, opts)?;
    Ok(RelayOutcome { fetch, upload })
}

/// The fetch half of [`relay`].
pub fn fetch_with(url: &str, opts: &RelayOptions) -> Result<FetchResult, RelayError> {
    let mut fetcher = Fetcher::new(url).http_options(opts.http);
    if let Some(dir) = &opts.download_dir {
        fetcher = fetcher.download_dir(dir);
    }
    fetcher.fetch()
}

/// The upload half of [`relay`], with a fresh driver and session.
pub fn upload_fetched(
    fetch: &FetchResult,
    token: &str,
    opts: &RelayOptions,
) -> Result<UploadOutcome, RelayError> {
    UploadDriver::new(opts.api.clone())
        .chunk_size(opts.chunk_size)
        .http_options(opts.http)
        .upload_as(&fetch.local_path, &fetch.remote_basename, token)
}
