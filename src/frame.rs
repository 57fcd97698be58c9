//! HTTP/2 frame layout (RFC 7540 Section 4).
//!
//! Only DATA and HEADERS carry meaning for a single exchange. SETTINGS is
//! parsed so it can be logged; every other frame type is consumed whole and
//! surfaced as [`Frame::Unhandled`] so the stream stays aligned.

use crate::error::FrameDecodeError;

/// Size of the fixed frame header.
pub const FRAME_HEADER_LEN: usize = 9;

/// Largest payload the 24-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = (1 << 24) - 1;

/// Protocol default for SETTINGS_MAX_FRAME_SIZE.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// HTTP/2 frame types (RFC 7540 Section 6)
#[allow(dead_code)]
pub mod frame_type {
    pub const DATA: u8 = 0x0;
    pub const HEADERS: u8 = 0x1;
    pub const PRIORITY: u8 = 0x2;
    pub const RST_STREAM: u8 = 0x3;
    pub const SETTINGS: u8 = 0x4;
    pub const PUSH_PROMISE: u8 = 0x5;
    pub const PING: u8 = 0x6;
    pub const GOAWAY: u8 = 0x7;
    pub const WINDOW_UPDATE: u8 = 0x8;
    pub const CONTINUATION: u8 = 0x9;

    /// Name used in logs and errors.
    pub fn name(frame_type: u8) -> &'static str {
        match frame_type {
            DATA => "DATA",
            HEADERS => "HEADERS",
            PRIORITY => "PRIORITY",
            RST_STREAM => "RST_STREAM",
            SETTINGS => "SETTINGS",
            PUSH_PROMISE => "PUSH_PROMISE",
            PING => "PING",
            GOAWAY => "GOAWAY",
            WINDOW_UPDATE => "WINDOW_UPDATE",
            CONTINUATION => "CONTINUATION",
            _ => "UNKNOWN",
        }
    }
}

/// HTTP/2 frame flags
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    /// Same bit as END_STREAM; meaningful on SETTINGS and PING only.
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// A parsed frame header (9 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u32,    // 24 bits
    pub frame_type: u8,
    pub flags: u8,
    pub stream_id: u32, // 31 bits (high bit reserved)
}

impl FrameHeader {
    pub fn new(length: u32, frame_type: u8, flags: u8, stream_id: u32) -> Self {
        Self {
            length,
            frame_type,
            flags,
            stream_id: stream_id & 0x7FFF_FFFF,
        }
    }

    /// Parse a 9-byte frame header
    pub fn parse(data: &[u8; FRAME_HEADER_LEN]) -> Self {
        let length = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | (data[2] as u32);
        let stream_id = u32::from_be_bytes([data[5], data[6], data[7], data[8]]);
        Self::new(length, data[3], data[4], stream_id)
    }

    /// Serialize into the 9-byte wire form.
    pub fn encode(&self) -> [u8; FRAME_HEADER_LEN] {
        let sid = (self.stream_id & 0x7FFF_FFFF).to_be_bytes();
        [
            (self.length >> 16) as u8,
            (self.length >> 8) as u8,
            self.length as u8,
            self.frame_type,
            self.flags,
            sid[0],
            sid[1],
            sid[2],
            sid[3],
        ]
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// One whole frame as seen by the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// DATA with padding removed.
    Data {
        stream_id: u32,
        data: Vec<u8>,
        end_stream: bool,
    },
    /// HEADERS with padding and priority fields removed.
    Headers {
        stream_id: u32,
        header_block: Vec<u8>,
        end_stream: bool,
        end_headers: bool,
    },
    /// Settings are parsed but never applied.
    Settings {
        ack: bool,
        settings: Vec<(u16, u32)>,
    },
    /// Any other frame type. Its payload has already been consumed.
    Unhandled {
        frame_type: u8,
        flags: u8,
        stream_id: u32,
        length: u32,
    },
}

impl Frame {
    /// Build a frame from its header and complete payload.
    pub fn from_parts(header: FrameHeader, payload: Vec<u8>) -> Result<Self, FrameDecodeError> {
        match header.frame_type {
            frame_type::DATA => Ok(Frame::Data {
                stream_id: header.stream_id,
                data: strip_data_padding(&header, payload)?,
                end_stream: header.has_flag(flags::END_STREAM),
            }),
            frame_type::HEADERS => Ok(Frame::Headers {
                stream_id: header.stream_id,
                header_block: extract_header_block(&header, payload)?,
                end_stream: header.has_flag(flags::END_STREAM),
                end_headers: header.has_flag(flags::END_HEADERS),
            }),
            frame_type::SETTINGS => parse_settings(&header, &payload),
            _ => Ok(Frame::Unhandled {
                frame_type: header.frame_type,
                flags: header.flags,
                stream_id: header.stream_id,
                length: header.length,
            }),
        }
    }

    pub fn stream_id(&self) -> u32 {
        match self {
            Frame::Data { stream_id, .. }
            | Frame::Headers { stream_id, .. }
            | Frame::Unhandled { stream_id, .. } => *stream_id,
            Frame::Settings { .. } => 0,
        }
    }

    /// True only for DATA or HEADERS carrying END_STREAM.
    pub fn is_end_stream(&self) -> bool {
        match self {
            Frame::Data { end_stream, .. } | Frame::Headers { end_stream, .. } => *end_stream,
            Frame::Settings { .. } | Frame::Unhandled { .. } => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Frame::Data { .. } => "DATA",
            Frame::Headers { .. } => "HEADERS",
            Frame::Settings { .. } => "SETTINGS",
            Frame::Unhandled { frame_type, .. } => frame_type::name(*frame_type),
        }
    }
}

/// Remove the pad length byte and trailing padding from a DATA payload.
fn strip_data_padding(header: &FrameHeader, mut payload: Vec<u8>) -> Result<Vec<u8>, FrameDecodeError> {
    if !header.has_flag(flags::PADDED) {
        return Ok(payload);
    }
    if payload.is_empty() {
        return Err(malformed("DATA", "PADDED flag with no payload"));
    }
    let pad_length = payload[0] as usize;
    if pad_length >= payload.len() {
        return Err(malformed("DATA", "padding exceeds payload"));
    }
    payload.truncate(payload.len() - pad_length);
    payload.remove(0);
    Ok(payload)
}

/// Extract the header block fragment, skipping padding and priority fields.
fn extract_header_block(header: &FrameHeader, mut payload: Vec<u8>) -> Result<Vec<u8>, FrameDecodeError> {
    let mut offset = 0;
    let mut end = payload.len();

    if header.has_flag(flags::PADDED) {
        if payload.is_empty() {
            return Err(malformed("HEADERS", "PADDED flag with no payload"));
        }
        let pad_length = payload[0] as usize;
        offset = 1;
        if pad_length >= payload.len() {
            return Err(malformed("HEADERS", "padding exceeds payload"));
        }
        end = payload.len() - pad_length;
    }

    if header.has_flag(flags::PRIORITY) {
        if end - offset < 5 {
            return Err(malformed("HEADERS", "PRIORITY flag with short payload"));
        }
        offset += 5; // stream dependency (4) + weight (1)
    }

    if offset == 0 && end == payload.len() {
        return Ok(payload);
    }
    payload.truncate(end);
    payload.drain(..offset);
    Ok(payload)
}

fn parse_settings(header: &FrameHeader, payload: &[u8]) -> Result<Frame, FrameDecodeError> {
    let ack = header.has_flag(flags::ACK);
    if payload.len() % 6 != 0 {
        return Err(malformed("SETTINGS", "length is not a multiple of 6"));
    }
    if ack && !payload.is_empty() {
        return Err(malformed("SETTINGS", "ACK with non-empty payload"));
    }
    let settings = payload
        .chunks_exact(6)
        .map(|entry| {
            let id = u16::from_be_bytes([entry[0], entry[1]]);
            let value = u32::from_be_bytes([entry[2], entry[3], entry[4], entry[5]]);
            (id, value)
        })
        .collect();
    Ok(Frame::Settings { ack, settings })
}

fn malformed(frame: &'static str, reason: &'static str) -> FrameDecodeError {
    FrameDecodeError::Malformed { frame, reason }
}
