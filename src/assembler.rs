//! Reconstructing one logical stream from a sequence of frames.

use std::time::Instant;

use crate::channel::{FrameChannel, Transport};
use crate::error::FrameDecodeError;
use crate::frame::Frame;
use crate::hpack::{HeaderField, HpackDecoder};

/// The inbound half of an exchange, complete once END_STREAM was seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Stream identifier of the most recent HEADERS frame.
    pub stream_id: u32,
    /// Decoded header fields, kept for diagnostics only. Empty when the
    /// header block could not be decoded.
    pub headers: Vec<HeaderField>,
    /// Concatenated DATA payloads.
    pub body: Vec<u8>,
}

/// Drives a channel's read side until a frame carries END_STREAM.
///
/// Owns the connection's inbound HPACK decoder, so one assembler must be used
/// per connection.
#[derive(Debug, Default)]
pub struct RequestAssembler {
    decoder: HpackDecoder,
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read frames until DATA or HEADERS carries END_STREAM.
    ///
    /// END_STREAM is the only way out of the loop besides an error. Without a
    /// `deadline` a peer that never sets it blocks this call forever.
    ///
    /// Header blocks are decoded best-effort: a decode failure is logged and
    /// assembly carries on, since only the stream id and body are required.
    pub fn assemble<T: Transport>(
        &mut self,
        channel: &mut FrameChannel<T>,
        deadline: Option<Instant>,
    ) -> Result<Request, FrameDecodeError> {
        let mut request = Request::default();

        loop {
            let frame = channel.read_frame_until(deadline)?;
            let end_stream = frame.is_end_stream();

            match frame {
                Frame::Headers { stream_id, header_block, end_headers, .. } => {
                    if !end_headers {
                        tracing::warn!(stream_id, "header block split across CONTINUATION frames is not supported");
                    }
                    match self.decoder.decode(&header_block) {
                        Ok(fields) => {
                            for field in &fields {
                                tracing::debug!(stream_id, %field, "request header");
                            }
                            request.headers = fields;
                        }
                        Err(e) => {
                            tracing::warn!(stream_id, error = %e, "failed to decode header block");
                        }
                    }
                    request.stream_id = stream_id;
                }
                Frame::Data { stream_id, data, .. } => {
                    if stream_id != request.stream_id {
                        tracing::debug!(stream_id, expected = request.stream_id, "DATA on unexpected stream");
                    }
                    request.body.extend_from_slice(&data);
                }
                Frame::Settings { ack, settings } => {
                    tracing::trace!(ack, count = settings.len(), "ignoring SETTINGS");
                }
                Frame::Unhandled { frame_type, stream_id, length, .. } => {
                    tracing::trace!(
                        frame = crate::frame::frame_type::name(frame_type),
                        stream_id,
                        length,
                        "ignoring frame"
                    );
                }
            }

            if end_stream {
                tracing::info!(stream_id = request.stream_id, bytes = request.body.len(), "stream complete");
                tracing::debug!(body = %String::from_utf8_lossy(&request.body), "stream body");
                return Ok(request);
            }
        }
    }
}
