//! Server configuration, loaded from TOML.
//!
//! ```toml
//! listen = "0.0.0.0:3000"
//! payload = "image.png"
//! content_type = "image/png"
//! chunk_size = 1024
//! read_timeout_secs = 30
//!
//! [tls]
//! cert = "localhost.pem"
//! key = "localhost-key.pem"
//! ```

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::frame::{DEFAULT_MAX_FRAME_SIZE, MAX_PAYLOAD_LEN};
use crate::server::ExchangeConfig;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// File served as the response body, reread for every connection.
    pub payload: PathBuf,
    pub content_type: String,
    /// Largest DATA payload written per frame.
    pub chunk_size: usize,
    /// Largest inbound frame payload accepted.
    pub max_frame_size: u32,
    /// Bound on reading one request; 0 waits forever.
    pub read_timeout_secs: u64,
    /// Plain TCP (prior-knowledge h2c) when absent.
    pub tls: Option<TlsFiles>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
            payload: PathBuf::from("image.png"),
            content_type: "image/png".to_string(),
            chunk_size: 1024,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout_secs: 30,
            tls: None,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.exchange()?;
        Ok(config)
    }

    /// The per-connection settings, validated.
    pub fn exchange(&self) -> Result<ExchangeConfig, ConfigError> {
        let chunk_size = NonZeroUsize::new(self.chunk_size)
            .ok_or_else(|| ConfigError::Invalid("chunk_size must be positive".into()))?;
        // Peer SETTINGS are never applied, so outbound frames must respect
        // the protocol default.
        if self.chunk_size > DEFAULT_MAX_FRAME_SIZE as usize {
            return Err(ConfigError::Invalid(format!(
                "chunk_size {} exceeds the default maximum frame size {}",
                self.chunk_size, DEFAULT_MAX_FRAME_SIZE
            )));
        }
        if self.max_frame_size < DEFAULT_MAX_FRAME_SIZE || self.max_frame_size as usize > MAX_PAYLOAD_LEN {
            return Err(ConfigError::Invalid(format!(
                "max_frame_size {} outside {}..={}",
                self.max_frame_size, DEFAULT_MAX_FRAME_SIZE, MAX_PAYLOAD_LEN
            )));
        }
        let read_timeout = match self.read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(ExchangeConfig {
            chunk_size,
            max_frame_size: self.max_frame_size,
            read_timeout,
        })
    }
}
