//! Error taxonomy for fetch and upload.
//!
//! Each stage has its own kind so callers can tell a bad locator from a flaky
//! network from a rejected credential. Nothing here is retried internally;
//! see [`crate::retry`] for the caller-side policy.

use std::io;
use std::path::PathBuf;

/// Why the fetch of the source URL failed.
#[derive(Debug, thiserror::Error)]
pub enum TransferFailure {
    /// libcurl reported an error (DNS, refused, reset, timeout, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Final HTTP response was not 2xx.
    #[error("HTTP {0}")]
    Status(u32),
    /// Writing the body to the local file failed.
    #[error("storage: {0}")]
    Storage(io::Error),
}

/// Why the resumable upload session could not be created.
#[derive(Debug, thiserror::Error)]
pub enum SessionInitFailure {
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Anything other than 200 on the initiation request.
    #[error("HTTP {code}: {body}")]
    Status { code: u32, body: String },
    /// 200 without a `Location` header.
    #[error("response carried no Location header")]
    MissingLocation,
}

/// Why a chunk PUT did not move the upload forward.
#[derive(Debug, thiserror::Error)]
pub enum ChunkFailure {
    /// No response: the request failed at the transport level.
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Non-terminal status without a usable `Range` header.
    #[error("server rejected chunk with HTTP {status}")]
    Rejected { status: u32 },
    /// `Range` header reported an offset that would not advance the cursor
    /// or would run past the end of the file.
    #[error("server reported resume offset {reported} (cursor {cursor}, total {total})")]
    BadResumeOffset { reported: u64, cursor: u64, total: u64 },
    /// The server kept nothing from this many chunks in a row.
    #[error("server kept none of the last {replies} chunks")]
    Stalled { replies: u32 },
    /// Every byte was acknowledged but the server never finalized the file.
    #[error("all {total} bytes acknowledged without a completion status")]
    NotFinalized { total: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("fetching {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: TransferFailure,
    },

    #[error("upload session init failed: {0}")]
    SessionInit(#[source] SessionInitFailure),

    #[error("chunk upload failed at byte {offset}: {source}")]
    ChunkUpload {
        offset: u64,
        #[source]
        source: ChunkFailure,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A fetch-derived value was read before the fetch ran.
    #[error("{what} must be set first: the fetch has not run")]
    NotFetched { what: &'static str },

    /// The driver already reached `Complete` or `Failed`.
    #[error("upload driver already finished; start a new one for another upload")]
    DriverFinished,

    #[error("token file {}: {reason}", .path.display())]
    Token { path: PathBuf, reason: String },
}

impl RelayError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RelayError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for kinds a caller may reasonably retry as a whole operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::Transfer { source, .. } => !matches!(source, TransferFailure::Storage(_)),
            RelayError::ChunkUpload { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_status_is_retryable_but_storage_is_not() {
        let status = RelayError::Transfer {
            url: "http://example.com/a".into(),
            source: TransferFailure::Status(503),
        };
        assert!(status.is_retryable());

        let storage = RelayError::Transfer {
            url: "http://example.com/a".into(),
            source: TransferFailure::Storage(io::Error::new(io::ErrorKind::Other, "disk full")),
        };
        assert!(!storage.is_retryable());
    }

    #[test]
    fn session_init_and_invalid_url_are_not_retryable() {
        let init = RelayError::SessionInit(SessionInitFailure::Status {
            code: 401,
            body: String::new(),
        });
        assert!(!init.is_retryable());
        let bad = RelayError::InvalidUrl {
            url: "nope".into(),
            reason: "relative URL without a base".into(),
        };
        assert!(!bad.is_retryable());
    }

    #[test]
    fn messages_name_the_stage() {
        let e = RelayError::ChunkUpload {
            offset: 500,
            source: ChunkFailure::Rejected { status: 500 },
        };
        assert_eq!(
            e.to_string(),
            "chunk upload failed at byte 500: server rejected chunk with HTTP 500"
        );
        let e = RelayError::NotFetched { what: "response URL" };
        assert!(e.to_string().starts_with("response URL must be set first"));
    }
}
