//! h2-oneshot: a minimal, blocking HTTP/2 framing core
//!
//! This crate carries exactly one request/response exchange per connection
//! over an already-established byte stream (plain TCP or a finished TLS
//! session). It is not a general HTTP/2 implementation.
//!
//! # Features
//!
//! - **Preface validation**: the 24-byte client preface, read once
//! - **Frame channel**: whole frames in, whole frames out, strictly ordered
//! - **Request assembly**: HEADERS + DATA until END_STREAM, with an optional
//!   deadline so a stalled peer can be dropped
//! - **Chunked responses**: one HEADERS frame, bounded DATA frames, and an
//!   empty END_STREAM terminator
//! - **HPACK Support**: Header compression via fluke-hpack
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::io;
//! use h2_oneshot::{Request, Response, Server, ServerConfig};
//!
//! let config = ServerConfig::default();
//! let server = Server::bind(&config).unwrap();
//! server.run(|request: &Request| -> io::Result<Response> {
//!     println!("stream {}: {} bytes", request.stream_id, request.body.len());
//!     Ok(Response::ok("image/png", std::fs::read("image.png")?))
//! });
//! ```
//!
//! # Architecture
//!
//! ```text
//! accept → [tls] → read_preface → SETTINGS → RequestAssembler → Handler → ResponseEmitter
//! ```
//!
//! It does NOT provide:
//! - Flow control, priority, or SETTINGS negotiation
//! - CONTINUATION frames, server push, GOAWAY
//! - More than one stream per connection or more than one connection at a time

pub mod assembler;
pub mod channel;
pub mod chunk;
pub mod client;
pub mod config;
pub mod emitter;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod hpack;
pub mod server;
pub mod tls;

pub use assembler::{Request, RequestAssembler};
pub use channel::{FrameChannel, Transport};
pub use chunk::{chunk_by, Chunks};
pub use client::{Client, ClientResponse};
pub use config::{ServerConfig, TlsFiles};
pub use emitter::{write_body, Response, ResponseEmitter, DEFAULT_CHUNK_SIZE};
pub use error::{
    ClientError, ConfigError, ConnectionError, FrameDecodeError, FrameWriteError, HeaderDecodeError, PrefaceError,
};
pub use frame::{flags, frame_type, Frame, FrameHeader, DEFAULT_MAX_FRAME_SIZE};
pub use handshake::{is_preface, read_preface, write_preface, CONNECTION_PREFACE};
pub use hpack::{HeaderField, HpackDecoder, HpackEncoder};
pub use server::{serve_exchange, ExchangeConfig, Handler, Server};
