//! Writing a response: one HEADERS frame, then the body as DATA frames.

use std::num::NonZeroUsize;

use crate::channel::{FrameChannel, Transport};
use crate::chunk::chunk_by;
use crate::error::FrameWriteError;
use crate::hpack::{HeaderField, HpackEncoder};

/// Chunk size used when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => unreachable!(),
};

/// A response with the fixed field set `:status`, `content-length`,
/// `content-type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    /// `200` with the given body.
    pub fn ok(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(200, content_type, body)
    }

    /// Header fields in the order they are encoded.
    pub fn header_fields(&self) -> Vec<HeaderField> {
        vec![
            HeaderField::new(":status", self.status.to_string()),
            HeaderField::new("content-length", self.body.len().to_string()),
            HeaderField::new("content-type", self.content_type.clone()),
        ]
    }
}

/// Writes responses on one connection. Owns the outbound HPACK encoder.
#[derive(Debug)]
pub struct ResponseEmitter {
    encoder: HpackEncoder,
    chunk_size: NonZeroUsize,
}

impl Default for ResponseEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ResponseEmitter {
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self {
            encoder: HpackEncoder::new(),
            chunk_size,
        }
    }

    /// HEADERS (END_HEADERS, never END_STREAM), one DATA per chunk, then an
    /// empty DATA with END_STREAM.
    ///
    /// Stops at the first failed write. Frames already written stay written.
    pub fn emit<T: Transport>(
        &mut self,
        channel: &mut FrameChannel<T>,
        stream_id: u32,
        response: &Response,
    ) -> Result<(), FrameWriteError> {
        let block = self.encoder.encode(&response.header_fields());
        tracing::debug!(stream_id, encoded_len = block.len(), "encoded response header block");

        channel.write_headers(stream_id, &block, false)?;
        write_body(channel, stream_id, &response.body, self.chunk_size)
    }
}

/// Write `body` as DATA frames of at most `chunk_size` bytes, none with
/// END_STREAM, then a final empty DATA frame with END_STREAM.
///
/// The terminator is written even when the body is empty or ends on a short
/// chunk, so the stream always ends the same way.
pub fn write_body<T: Transport>(
    channel: &mut FrameChannel<T>,
    stream_id: u32,
    body: &[u8],
    chunk_size: NonZeroUsize,
) -> Result<(), FrameWriteError> {
    let mut frames = 0usize;
    for chunk in chunk_by(body, chunk_size) {
        channel.write_data(stream_id, chunk, false)?;
        frames += 1;
    }
    channel.write_data(stream_id, &[], true)?;

    tracing::debug!(stream_id, bytes = body.len(), frames, "body written");
    Ok(())
}
