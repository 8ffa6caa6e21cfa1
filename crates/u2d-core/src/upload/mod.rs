//! Chunked resumable upload driver.
//!
//! Opens a session, then PUTs the file in order, one chunk at a time, moving
//! the byte cursor to whatever the server says it has received. A reply that
//! kept nothing resends the same range, up to [`MAX_STALLED_REPLIES`] times
//! in a row. The loop stops on the first 200/201. Requests are strictly
//! sequential: each chunk starts where the previous acknowledgement left off.

mod put;
mod range;
mod session;

pub use session::{UploadApi, DEFAULT_INIT_ENDPOINT};

use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::chunk::{read_chunk, ChunkRange, DEFAULT_CHUNK_SIZE};
use crate::error::{ChunkFailure, RelayError};
use crate::http::HttpOptions;

/// Consecutive replies that keep nothing before the upload gives up.
pub const MAX_STALLED_REPLIES: u32 = 3;

/// Where an [`UploadDriver`] is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Uploading { cursor: u64, total: u64 },
    Complete,
    Failed,
}

/// File metadata returned in the completion response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub remote_name: String,
    pub total_size: u64,
    /// Number of chunk PUTs sent.
    pub requests: u32,
    /// `None` for empty files (no PUT is sent) or a non-JSON completion body.
    pub file: Option<UploadedFile>,
}

/// Drives one upload. Once `Complete` or `Failed` it refuses further work;
/// build a new driver for the next file.
#[derive(Debug, Clone)]
pub struct UploadDriver {
    api: UploadApi,
    chunk_size: u64,
    state: UploadState,
}

impl Default for UploadDriver {
    fn default() -> Self {
        Self::new(UploadApi::default())
    }
}

impl UploadDriver {
    pub fn new(api: UploadApi) -> Self {
        UploadDriver {
            api,
            chunk_size: DEFAULT_CHUNK_SIZE,
            state: UploadState::Idle,
        }
    }

    /// Bytes per PUT. Clamped to `1..=u32::MAX`; the storage API wants a
    /// multiple of 256 KiB, which [`crate::config`] enforces for user input.
    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes.clamp(1, u64::from(u32::MAX));
        self
    }

    pub fn http_options(mut self, opts: HttpOptions) -> Self {
        self.api = self.api.http_options(opts);
        self
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Uploads `local_path` under its own file name.
    pub fn upload(&mut self, local_path: &Path, token: &str) -> Result<UploadOutcome, RelayError> {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.upload_as(local_path, &name, token)
    }

    /// Uploads `local_path` as `remote_name`.
    pub fn upload_as(
        &mut self,
        local_path: &Path,
        remote_name: &str,
        token: &str,
    ) -> Result<UploadOutcome, RelayError> {
        if self.state != UploadState::Idle {
            return Err(RelayError::DriverFinished);
        }
        let result = self.run(local_path, remote_name, token);
        self.state = match &result {
            Ok(_) => UploadState::Complete,
            Err(e) => {
                tracing::error!(path = %local_path.display(), "upload failed: {}", e);
                UploadState::Failed
            }
        };
        result
    }

    fn run(
        &mut self,
        local_path: &Path,
        remote_name: &str,
        token: &str,
    ) -> Result<UploadOutcome, RelayError> {
        let io_err = |e: io::Error| RelayError::io(local_path, e);
        let mut file = File::open(local_path).map_err(io_err)?;
        let total = file.metadata().map_err(io_err)?.len();

        self.state = UploadState::Uploading { cursor: 0, total };
        let endpoint = self.api.open(token, remote_name, total)?;

        let mut outcome = UploadOutcome {
            remote_name: remote_name.to_string(),
            total_size: total,
            requests: 0,
            file: None,
        };
        if total == 0 {
            tracing::info!(name = remote_name, "empty file, nothing to send");
            return Ok(outcome);
        }

        let mut cursor = 0u64;
        let mut stalled = 0u32;
        while let Some(range) = ChunkRange::at(cursor, self.chunk_size, total) {
            // chunk_size is capped at u32::MAX, so the length fits.
            let data = read_chunk(&mut file, range.start, range.len() as u32).map_err(io_err)?;
            if data.len() as u64 != range.len() {
                return Err(io_err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("file shrank during upload: wanted {} bytes at {}", range.len(), range.start),
                )));
            }

            outcome.requests += 1;
            let reply = put::put_chunk(&endpoint, self.api.http(), range, total, &data).map_err(
                |e| RelayError::ChunkUpload {
                    offset: cursor,
                    source: ChunkFailure::Curl(e),
                },
            )?;

            if reply.is_complete() {
                outcome.file = parse_uploaded_file(&reply.body);
                tracing::info!(
                    name = remote_name,
                    total,
                    requests = outcome.requests,
                    id = outcome.file.as_ref().map(|f| f.id.as_str()),
                    "upload complete"
                );
                return Ok(outcome);
            }

            let next = range::next_cursor(reply.status, reply.headers.get("range"), cursor, total)
                .map_err(|source| RelayError::ChunkUpload {
                    offset: cursor,
                    source,
                })?;
            tracing::debug!(
                content_range = %range.content_range(total),
                status = reply.status,
                next,
                "chunk acknowledged"
            );
            if next == cursor {
                stalled += 1;
                if stalled >= MAX_STALLED_REPLIES {
                    return Err(RelayError::ChunkUpload {
                        offset: cursor,
                        source: ChunkFailure::Stalled { replies: stalled },
                    });
                }
            } else {
                stalled = 0;
            }
            cursor = next;
            self.state = UploadState::Uploading { cursor, total };
        }

        Err(RelayError::ChunkUpload {
            offset: cursor,
            source: ChunkFailure::NotFinalized { total },
        })
    }
}

fn parse_uploaded_file(body: &[u8]) -> Option<UploadedFile> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(f) => Some(f),
        Err(e) => {
            tracing::warn!("completion response is not file metadata: {}", e);
            None
        }
    }
}
