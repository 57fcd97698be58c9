//! The requesting side of a single exchange.
//!
//! Sends one POST on stream 1 and reads the response back through the same
//! [`RequestAssembler`] loop the server uses. Server SETTINGS are read and
//! ignored, never acknowledged.

use std::net::{TcpStream, ToSocketAddrs};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use rustls::pki_types::ServerName;

use crate::assembler::RequestAssembler;
use crate::channel::{FrameChannel, Transport};
use crate::emitter::{write_body, DEFAULT_CHUNK_SIZE};
use crate::error::ClientError;
use crate::handshake;
use crate::hpack::{self, HeaderField, HpackEncoder};

/// Stream identifier used for the request. Client streams are odd.
pub const REQUEST_STREAM_ID: u32 = 1;

/// What came back from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    pub status: u16,
    pub headers: Vec<HeaderField>,
    pub body: Vec<u8>,
}

impl ClientResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        hpack::find(&self.headers, name)
    }
}

/// A connection that has sent its preface and is ready for one request.
#[derive(Debug)]
pub struct Client<T> {
    channel: FrameChannel<T>,
    scheme: &'static str,
    chunk_size: NonZeroUsize,
}

impl Client<TcpStream> {
    /// Plain TCP with prior knowledge of HTTP/2.
    pub fn connect_tcp<A: ToSocketAddrs>(addr: A) -> Result<Self, ClientError> {
        let sock = TcpStream::connect(addr).map_err(ClientError::Connect)?;
        sock.set_nodelay(true)?;
        Self::handshake(sock, "http")
    }
}

impl Client<rustls::StreamOwned<rustls::ClientConnection, TcpStream>> {
    /// TLS with ALPN `h2`, verifying the server as `server_name`.
    pub fn connect_tls<A: ToSocketAddrs>(
        addr: A,
        config: Arc<rustls::ClientConfig>,
        server_name: &str,
    ) -> Result<Self, ClientError> {
        let name = ServerName::try_from(server_name.to_string())
            .map_err(|_| ClientError::ServerName(server_name.to_string()))?;
        let mut conn = rustls::ClientConnection::new(config, name)?;
        let mut sock = TcpStream::connect(addr).map_err(ClientError::Connect)?;
        sock.set_nodelay(true)?;
        while conn.is_handshaking() {
            conn.complete_io(&mut sock)?;
        }
        tracing::debug!(
            alpn = ?conn.alpn_protocol().map(String::from_utf8_lossy),
            "tls established"
        );
        Self::handshake(rustls::StreamOwned::new(conn, sock), "https")
    }
}

impl<T: Transport> Client<T> {
    /// Write the preface and an empty SETTINGS frame.
    pub fn handshake(transport: T, scheme: &'static str) -> Result<Self, ClientError> {
        let mut transport = transport;
        handshake::write_preface(&mut transport)?;
        let mut channel = FrameChannel::new(transport);
        channel.write_settings()?;
        Ok(Self {
            channel,
            scheme,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Send one POST and wait for the complete response.
    ///
    /// Consumes the client: the server answers exactly one request per
    /// connection.
    pub fn post(
        mut self,
        authority: &str,
        path: &str,
        content_type: &str,
        body: &[u8],
        deadline: Option<Instant>,
    ) -> Result<ClientResponse, ClientError> {
        let fields = vec![
            HeaderField::new(":method", "POST"),
            HeaderField::new(":scheme", self.scheme),
            HeaderField::new(":authority", authority),
            HeaderField::new(":path", path),
            HeaderField::new("content-type", content_type),
            HeaderField::new("content-length", body.len().to_string()),
        ];
        let block = HpackEncoder::new().encode(&fields);
        self.channel.write_headers(REQUEST_STREAM_ID, &block, false)?;
        write_body(&mut self.channel, REQUEST_STREAM_ID, body, self.chunk_size)?;

        let inbound = RequestAssembler::new().assemble(&mut self.channel, deadline)?;
        let status = hpack::find(&inbound.headers, ":status")
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or(ClientError::MissingStatus)?;

        tracing::info!(status, bytes = inbound.body.len(), "response received");
        Ok(ClientResponse {
            status,
            headers: inbound.headers,
            body: inbound.body,
        })
    }
}
