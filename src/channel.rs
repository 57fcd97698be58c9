//! Blocking, frame-at-a-time duplex channel over a byte stream.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use crate::error::{FrameDecodeError, FrameWriteError};
use crate::frame::{flags, frame_type, Frame, FrameHeader, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_LEN, MAX_PAYLOAD_LEN};

/// A blocking byte stream whose reads can be bounded in time.
///
/// `set_read_timeout(None)` means reads block indefinitely.
pub trait Transport: Read + Write {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }
}

impl Transport for rustls::StreamOwned<rustls::ServerConnection, TcpStream> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.sock.set_read_timeout(timeout)
    }
}

impl Transport for rustls::StreamOwned<rustls::ClientConnection, TcpStream> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.sock.set_read_timeout(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_read_timeout(timeout)
    }
}

/// Reads and writes whole frames, strictly in order.
///
/// Writes are assembled into one buffer and issued as a single `write_all`,
/// so a frame is never interleaved with another on the same channel.
#[derive(Debug)]
pub struct FrameChannel<T> {
    transport: T,
    max_frame_size: u32,
    timeout_armed: bool,
}

impl<T: Transport> FrameChannel<T> {
    pub fn new(transport: T) -> Self {
        Self::with_max_frame_size(transport, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Inbound frames with a payload longer than `max_frame_size` are rejected.
    pub fn with_max_frame_size(transport: T, max_frame_size: u32) -> Self {
        Self {
            transport,
            max_frame_size,
            timeout_armed: false,
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Block until one whole frame has been read.
    pub fn read_frame(&mut self) -> Result<Frame, FrameDecodeError> {
        self.read_frame_until(None)
    }

    /// Read one whole frame, giving up once `deadline` has passed.
    ///
    /// With `None` this blocks for as long as the peer stays silent.
    pub fn read_frame_until(&mut self, deadline: Option<Instant>) -> Result<Frame, FrameDecodeError> {
        self.arm_timeout(deadline)?;

        let mut head = [0u8; FRAME_HEADER_LEN];
        read_fully(&mut self.transport, &mut head, false)?;
        let header = FrameHeader::parse(&head);

        if header.length > self.max_frame_size {
            return Err(FrameDecodeError::FrameTooLarge {
                length: header.length,
                max: self.max_frame_size,
            });
        }

        let mut payload = vec![0u8; header.length as usize];
        read_fully(&mut self.transport, &mut payload, true)?;

        tracing::trace!(
            frame = frame_type::name(header.frame_type),
            flags = header.flags,
            stream_id = header.stream_id,
            length = header.length,
            "read frame"
        );
        Frame::from_parts(header, payload)
    }

    fn arm_timeout(&mut self, deadline: Option<Instant>) -> Result<(), FrameDecodeError> {
        match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(FrameDecodeError::TimedOut);
                }
                self.transport
                    .set_read_timeout(Some(remaining))
                    .map_err(FrameDecodeError::Io)?;
                self.timeout_armed = true;
            }
            None if self.timeout_armed => {
                self.transport
                    .set_read_timeout(None)
                    .map_err(FrameDecodeError::Io)?;
                self.timeout_armed = false;
            }
            None => {}
        }
        Ok(())
    }

    /// Serialize and write one frame, then flush.
    pub fn write_frame(
        &mut self,
        frame_type: u8,
        flags: u8,
        stream_id: u32,
        payload: &[u8],
    ) -> Result<(), FrameWriteError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameWriteError::PayloadTooLarge(payload.len()));
        }
        let header = FrameHeader::new(payload.len() as u32, frame_type, flags, stream_id);

        let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(payload);

        let frame = frame_type::name(frame_type);
        self.transport
            .write_all(&buf)
            .and_then(|()| self.transport.flush())
            .map_err(|source| FrameWriteError::Io { frame, source })?;

        tracing::trace!(frame, flags, stream_id, length = payload.len(), "wrote frame");
        Ok(())
    }

    /// Write an empty, non-ACK SETTINGS frame: all protocol defaults.
    pub fn write_settings(&mut self) -> Result<(), FrameWriteError> {
        self.write_frame(frame_type::SETTINGS, 0, 0, &[])
    }

    /// Write a complete header block as one HEADERS frame (END_HEADERS always set).
    pub fn write_headers(&mut self, stream_id: u32, block: &[u8], end_stream: bool) -> Result<(), FrameWriteError> {
        let mut flags_byte = flags::END_HEADERS;
        if end_stream {
            flags_byte |= flags::END_STREAM;
        }
        self.write_frame(frame_type::HEADERS, flags_byte, stream_id, block)
    }

    pub fn write_data(&mut self, stream_id: u32, data: &[u8], end_stream: bool) -> Result<(), FrameWriteError> {
        let flags_byte = if end_stream { flags::END_STREAM } else { 0 };
        self.write_frame(frame_type::DATA, flags_byte, stream_id, data)
    }
}

/// `read_exact` that tells a clean close from a close partway through a frame.
fn read_fully<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8], started: bool) -> Result<(), FrameDecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                let err = io::Error::from(io::ErrorKind::UnexpectedEof);
                return Err(FrameDecodeError::from_io(err, started || filled > 0));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(FrameDecodeError::from_io(e, started || filled > 0)),
        }
    }
    Ok(())
}
