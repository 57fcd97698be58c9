//! Shared helpers: frame builders and an in-memory transport.

use std::io::{self, Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use h2_oneshot::frame::FRAME_HEADER_LEN;
use h2_oneshot::{FrameHeader, Transport};

/// Reads from a fixed byte script, records everything written.
pub struct Scripted {
    input: Cursor<Vec<u8>>,
    pub output: Vec<u8>,
}

impl Scripted {
    pub fn new(input: Vec<u8>) -> Self {
        Self {
            input: Cursor::new(input),
            output: Vec::new(),
        }
    }
}

impl Read for Scripted {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Scripted {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for Scripted {
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

/// One encoded frame.
pub fn frame(frame_type: u8, flags: u8, stream_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = FrameHeader::new(payload.len() as u32, frame_type, flags, stream_id)
        .encode()
        .to_vec();
    out.extend_from_slice(payload);
    out
}

/// Split a byte stream back into (header, payload) pairs.
pub fn split_frames(mut bytes: &[u8]) -> Vec<(FrameHeader, Vec<u8>)> {
    let mut frames = Vec::new();
    while !bytes.is_empty() {
        let head: [u8; FRAME_HEADER_LEN] = bytes[..FRAME_HEADER_LEN].try_into().unwrap();
        let header = FrameHeader::parse(&head);
        let end = FRAME_HEADER_LEN + header.length as usize;
        frames.push((header, bytes[FRAME_HEADER_LEN..end].to_vec()));
        bytes = &bytes[end..];
    }
    frames
}

/// A connected loopback TCP pair: (accepted side, connecting side).
pub fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (server, _) = listener.accept().unwrap();
    (server, client)
}

/// A 2500-byte payload with a recognizable pattern.
pub fn payload() -> Vec<u8> {
    (0..2500u32).map(|i| (i % 251) as u8).collect()
}
