//! `Range` response header handling for resume offsets.

use crate::error::ChunkFailure;

/// Status the storage API uses for "keep sending".
pub(crate) const RESUME_INCOMPLETE: u32 = 308;

/// Last received byte from a `Range` response header such as `bytes=0-499`.
pub(crate) fn parse_range_end(value: &str) -> Option<u64> {
    let (_, last) = value.trim().rsplit_once('-')?;
    last.trim().parse::<u64>().ok()
}

/// Next send offset after a non-terminal reply: last received byte + 1.
///
/// The offset may equal `cursor` (the server kept none of the chunk) but
/// never moves back or past `total`. A 308 without `Range` means nothing has
/// been received yet, which is only consistent at cursor 0. Any other status
/// without a usable `Range` rejects the chunk.
pub(crate) fn next_cursor(
    status: u32,
    range: Option<&str>,
    cursor: u64,
    total: u64,
) -> Result<u64, ChunkFailure> {
    let reported = match range.and_then(parse_range_end) {
        Some(last) => last.saturating_add(1),
        None if status == RESUME_INCOMPLETE => 0,
        None => return Err(ChunkFailure::Rejected { status }),
    };
    if reported < cursor || reported > total {
        return Err(ChunkFailure::BadResumeOffset {
            reported,
            cursor,
            total,
        });
    }
    Ok(reported)
}
