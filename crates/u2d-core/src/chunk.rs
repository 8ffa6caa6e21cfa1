//! Chunk planning and reading for the upload loop.

use std::io::{self, Read, Seek, SeekFrom};

/// Default upload chunk size: 512 KiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 512 * 1024;

/// Granularity the storage API requires for every chunk except the last.
pub const CHUNK_GRANULARITY: u64 = 256 * 1024;

/// A contiguous byte range [start, end) of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ChunkRange {
    /// The range starting at `cursor`, at most `chunk_size` long, clipped to
    /// `total`. `None` once the cursor has reached the end.
    pub fn at(cursor: u64, chunk_size: u64, total: u64) -> Option<Self> {
        if cursor >= total || chunk_size == 0 {
            return None;
        }
        let len = chunk_size.min(total - cursor);
        Some(ChunkRange {
            start: cursor,
            end: cursor + len,
        })
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Content-Range` request header value (inclusive end).
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end - 1, total)
    }
}

/// Seeks `handle` to `offset` and reads up to `size` bytes.
///
/// Short only at end of file; I/O errors propagate unchanged.
pub fn read_chunk<R: Read + Seek>(handle: &mut R, offset: u64, size: u32) -> io::Result<Vec<u8>> {
    handle.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(size as usize);
    handle.by_ref().take(u64::from(size)).read_to_end(&mut buf)?;
    Ok(buf)
}
