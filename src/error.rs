//! Error taxonomy for the exchange.
//!
//! Every error is fatal to the connection it occurred on and nothing else.
//! The one exception is [`HeaderDecodeError`] on the inbound side, which the
//! request assembler logs and then ignores.

use std::io;

/// The connection did not open with the HTTP/2 client preface.
#[derive(Debug, thiserror::Error)]
pub enum PrefaceError {
    /// The stream ended or failed before 24 bytes were read.
    #[error("failed to read connection preface: {0}")]
    Read(#[source] io::Error),

    /// The read deadline passed before 24 bytes arrived.
    #[error("timed out waiting for connection preface")]
    TimedOut,

    /// 24 bytes were read but they are not the preface.
    #[error("invalid connection preface: {:?}", String::from_utf8_lossy(.0))]
    Mismatch(Vec<u8>),
}

/// A frame could not be read from the stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    /// The peer closed the stream cleanly between two frames.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The peer closed the stream in the middle of a frame.
    #[error("connection closed mid-frame")]
    Truncated,

    /// The declared payload length is larger than we accept.
    #[error("frame payload of {length} bytes exceeds maximum of {max}")]
    FrameTooLarge { length: u32, max: u32 },

    /// The payload does not fit the layout its frame type requires.
    #[error("malformed {frame} frame: {reason}")]
    Malformed {
        frame: &'static str,
        reason: &'static str,
    },

    /// The read deadline passed before a whole frame arrived.
    #[error("timed out waiting for frame")]
    TimedOut,

    #[error("i/o error while reading frame: {0}")]
    Io(#[source] io::Error),
}

impl FrameDecodeError {
    /// Classify an I/O error hit while reading the frame header or payload.
    ///
    /// `started` is true once at least one byte of the frame has been read.
    pub(crate) fn from_io(err: io::Error, started: bool) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof if started => Self::Truncated,
            io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::TimedOut,
            _ => Self::Io(err),
        }
    }
}

/// A frame could not be written to the stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameWriteError {
    #[error("payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),

    #[error("failed to write {frame} frame: {source}")]
    Io {
        frame: &'static str,
        #[source]
        source: io::Error,
    },
}

/// An HPACK header block could not be decoded.
#[derive(Debug, Clone, thiserror::Error)]
#[error("HPACK decode error: {0}")]
pub struct HeaderDecodeError(pub String);

/// Why handling a single accepted connection failed.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Preface(#[from] PrefaceError),

    #[error(transparent)]
    FrameDecode(#[from] FrameDecodeError),

    #[error(transparent)]
    FrameWrite(#[from] FrameWriteError),

    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    /// TLS completed but the peer did not select `h2` via ALPN.
    #[error("peer negotiated {0:?} instead of h2")]
    Alpn(Option<String>),

    /// The handler could not produce a response body.
    #[error("handler failed: {0}")]
    Handler(#[source] io::Error),

    /// The listener failed to accept a connection.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Why a client exchange failed.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect: {0}")]
    Connect(#[source] io::Error),

    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("invalid server name: {0}")]
    ServerName(String),

    #[error(transparent)]
    FrameDecode(#[from] FrameDecodeError),

    #[error(transparent)]
    FrameWrite(#[from] FrameWriteError),

    /// The response header block carried no usable `:status`.
    #[error("response has no valid :status header")]
    MissingStatus,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Invalid or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
