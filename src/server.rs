//! Accepting connections and running one exchange on each.
//!
//! Connections are handled strictly one after another. A failure is fatal to
//! the connection it happened on and is logged; the accept loop carries on.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assembler::{Request, RequestAssembler};
use crate::channel::{FrameChannel, Transport};
use crate::config::ServerConfig;
use crate::emitter::{Response, ResponseEmitter, DEFAULT_CHUNK_SIZE};
use crate::error::{ConfigError, ConnectionError, PrefaceError};
use crate::frame::DEFAULT_MAX_FRAME_SIZE;
use crate::handshake;
use crate::tls;

/// Bound on the TLS handshake, separate from the request read timeout.
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed `accept` so a persistent failure (EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Per-connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    pub chunk_size: NonZeroUsize,
    pub max_frame_size: u32,
    /// Bound on assembling the request. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: None,
        }
    }
}

/// Produces the response for an assembled request.
pub trait Handler {
    fn respond(&mut self, request: &Request) -> io::Result<Response>;
}

impl<F> Handler for F
where
    F: FnMut(&Request) -> io::Result<Response>,
{
    fn respond(&mut self, request: &Request) -> io::Result<Response> {
        self(request)
    }
}

/// Run one exchange on an already-established stream.
///
/// Preface, then an empty SETTINGS, then the request, then the response.
/// All protocol state lives on this call's stack and is dropped with it.
///
/// `config.read_timeout` bounds the preface and the request together, so a
/// peer that connects and never writes is dropped as well.
pub fn serve_exchange<T, H>(transport: T, config: &ExchangeConfig, handler: &mut H) -> Result<Request, ConnectionError>
where
    T: Transport,
    H: Handler + ?Sized,
{
    let mut transport = transport;
    let deadline = config.read_timeout.map(|t| Instant::now() + t);
    if let Some(timeout) = config.read_timeout {
        if timeout.is_zero() {
            return Err(PrefaceError::TimedOut.into());
        }
        transport.set_read_timeout(Some(timeout))?;
    }
    handshake::read_preface(&mut transport)?;

    let mut channel = FrameChannel::with_max_frame_size(transport, config.max_frame_size);
    channel.write_settings()?;

    let request = RequestAssembler::new().assemble(&mut channel, deadline)?;

    let response = handler.respond(&request).map_err(ConnectionError::Handler)?;
    ResponseEmitter::new(config.chunk_size).emit(&mut channel, request.stream_id, &response)?;

    tracing::info!(
        stream_id = request.stream_id,
        status = response.status,
        bytes = response.body.len(),
        "exchange complete"
    );
    Ok(request)
}

/// A bound listener that serves one connection at a time.
pub struct Server {
    listener: TcpListener,
    tls: Option<Arc<rustls::ServerConfig>>,
    exchange: ExchangeConfig,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listener", &self.listener)
            .field("tls", &self.tls.is_some())
            .field("exchange", &self.exchange)
            .finish()
    }
}

impl Server {
    /// Bind the configured address and load TLS material, if any.
    pub fn bind(config: &ServerConfig) -> Result<Self, ConfigError> {
        let exchange = config.exchange()?;
        let tls = match &config.tls {
            Some(files) => {
                let certs = tls::load_certs(&files.cert).map_err(|source| ConfigError::Read {
                    path: files.cert.display().to_string(),
                    source,
                })?;
                let key = tls::load_private_key(&files.key).map_err(|source| ConfigError::Read {
                    path: files.key.display().to_string(),
                    source,
                })?;
                let server_config =
                    tls::server_config(certs, key).map_err(|e| ConfigError::Invalid(format!("tls: {}", e)))?;
                Some(server_config)
            }
            None => None,
        };
        let listener = TcpListener::bind(config.listen).map_err(|source| ConfigError::Bind {
            addr: config.listen,
            source,
        })?;
        Ok(Self::from_parts(listener, tls, exchange))
    }

    pub fn from_parts(listener: TcpListener, tls: Option<Arc<rustls::ServerConfig>>, exchange: ExchangeConfig) -> Self {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, tls = tls.is_some(), "listening");
        }
        Self { listener, tls, exchange }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept a single connection and serve it to completion.
    ///
    /// Failures are logged under the connection's span before being returned.
    pub fn accept_one<H: Handler + ?Sized>(&self, handler: &mut H) -> Result<Request, ConnectionError> {
        let (sock, peer) = self.listener.accept().map_err(|e| {
            tracing::warn!(error = %e, "accept failed");
            ConnectionError::Accept(e)
        })?;
        let span = tracing::info_span!("connection", %peer);
        let _enter = span.enter();
        tracing::debug!("accepted");

        let result = self.handle(sock, handler);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "connection failed");
        }
        result
    }

    /// Serve connections forever, one at a time. A failed connection never
    /// stops the loop; a failed `accept` pauses it briefly.
    pub fn run<H: Handler>(&self, mut handler: H) -> ! {
        loop {
            if let Err(e) = self.accept_one(&mut handler) {
                if let Some(delay) = retry_delay(&e) {
                    std::thread::sleep(delay);
                }
            }
        }
    }

    fn handle<H: Handler + ?Sized>(&self, mut sock: TcpStream, handler: &mut H) -> Result<Request, ConnectionError> {
        sock.set_nodelay(true)?;
        let Some(tls_config) = &self.tls else {
            return serve_exchange(&mut sock, &self.exchange, handler);
        };

        let mut conn = rustls::ServerConnection::new(Arc::clone(tls_config))?;
        sock.set_read_timeout(Some(TLS_HANDSHAKE_TIMEOUT))?;
        while conn.is_handshaking() {
            conn.complete_io(&mut sock)?;
        }
        sock.set_read_timeout(None)?;

        match conn.alpn_protocol() {
            Some(proto) if proto == tls::ALPN_H2 => {}
            other => {
                let negotiated = other.map(|p| String::from_utf8_lossy(p).into_owned());
                return Err(ConnectionError::Alpn(negotiated));
            }
        }

        let mut stream = rustls::StreamOwned::new(conn, sock);
        let request = serve_exchange(&mut stream, &self.exchange, handler)?;

        stream.conn.send_close_notify();
        if let Err(e) = stream.conn.complete_io(&mut stream.sock) {
            tracing::debug!(error = %e, "close_notify not delivered");
        }
        Ok(request)
    }
}

/// How long the accept loop waits before trying again after `err`.
fn retry_delay(err: &ConnectionError) -> Option<Duration> {
    match err {
        ConnectionError::Accept(_) => Some(ACCEPT_BACKOFF),
        _ => None,
    }
}
