//! One chunk PUT to the session endpoint.

use std::io::Read;

use crate::chunk::ChunkRange;
use crate::http::{self, HttpOptions, ResponseHeaders};

/// What the server said about one chunk.
#[derive(Debug)]
pub(super) struct ChunkReply {
    pub status: u32,
    pub headers: ResponseHeaders,
    pub body: Vec<u8>,
}

impl ChunkReply {
    /// 200 and 201 both mean the file is complete.
    pub fn is_complete(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

/// PUTs `data` as `range` of a `total`-byte file. An `Err` means no
/// response was received.
pub(super) fn put_chunk(
    endpoint: &str,
    opts: &HttpOptions,
    range: ChunkRange,
    total: u64,
    data: &[u8],
) -> Result<ChunkReply, curl::Error> {
    let content_range = range.content_range(total);

    let mut easy = http::easy_for(endpoint, opts)?;
    easy.upload(true)?;
    easy.in_filesize(data.len() as u64)?;
    easy.http_headers(http::header_list(&[
        ("Content-Range", content_range.as_str()),
        ("Expect", ""),
    ])?)?;

    let mut source = data;
    let mut headers = ResponseHeaders::new();
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.read_function(|buf| Ok(source.read(buf).unwrap_or(0)))?;
        transfer.header_function(|line| {
            headers.push_raw(line);
            true
        })?;
        transfer.write_function(|chunk| {
            body.extend_from_slice(chunk);
            Ok(chunk.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(ChunkReply {
        status,
        headers,
        body,
    })
}
