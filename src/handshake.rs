//! Connection preface (RFC 7540 Section 3.5).

use std::io::{self, Read, Write};

use crate::error::PrefaceError;

/// The HTTP/2 connection preface (24 bytes)
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Check that `data` is exactly the connection preface.
pub fn is_preface(data: &[u8]) -> bool {
    data == CONNECTION_PREFACE
}

/// Read exactly 24 bytes and require them to be the preface.
///
/// Called once, before any frame is exchanged. There is no retry. A read
/// timeout armed on the underlying stream surfaces as
/// [`PrefaceError::TimedOut`].
pub fn read_preface<R: Read + ?Sized>(reader: &mut R) -> Result<(), PrefaceError> {
    let mut buf = [0u8; CONNECTION_PREFACE.len()];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => PrefaceError::TimedOut,
        _ => PrefaceError::Read(e),
    })?;
    if !is_preface(&buf) {
        return Err(PrefaceError::Mismatch(buf.to_vec()));
    }
    Ok(())
}

/// Client side: open the connection with the preface.
pub fn write_preface<W: Write + ?Sized>(writer: &mut W) -> io::Result<()> {
    writer.write_all(CONNECTION_PREFACE)
}
