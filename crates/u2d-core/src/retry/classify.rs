//! Map relay errors onto retry kinds.

use crate::error::{ChunkFailure, RelayError, TransferFailure};

use super::policy::ErrorKind;

pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Only fetch transfers and chunk uploads are ever worth another attempt;
/// everything else needs the caller to change something first.
pub fn classify(e: &RelayError) -> ErrorKind {
    match e {
        RelayError::Transfer { source, .. } => match source {
            TransferFailure::Curl(ce) => classify_curl_error(ce),
            TransferFailure::Status(code) => classify_http_status(*code),
            TransferFailure::Storage(_) => ErrorKind::Other,
        },
        RelayError::ChunkUpload { source, .. } => match source {
            ChunkFailure::Curl(ce) => match classify_curl_error(ce) {
                ErrorKind::Other => ErrorKind::Connection,
                kind => kind,
            },
            ChunkFailure::Rejected { status } => match classify_http_status(*status) {
                ErrorKind::Other => ErrorKind::Connection,
                kind => kind,
            },
            ChunkFailure::BadResumeOffset { .. }
            | ChunkFailure::Stalled { .. }
            | ChunkFailure::NotFinalized { .. } => ErrorKind::Connection,
        },
        _ => ErrorKind::Other,
    }
}
