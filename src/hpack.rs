//! HPACK: Header Compression for HTTP/2 (RFC 7541)
//!
//! Thin wrapper around `fluke-hpack`. Each connection owns one decoder for
//! its inbound direction and one encoder for its outbound direction; the two
//! never share state.

use crate::error::HeaderDecodeError;

/// A single header field. Order within a list is preserved end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Find the first field named `name` in a header list.
pub fn find<'a>(fields: &'a [HeaderField], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.value.as_str())
}

/// HPACK decoder for inbound header blocks.
/// Wraps `fluke_hpack::Decoder`, whose dynamic table lives as long as the
/// connection that owns it.
pub struct HpackDecoder {
    inner: fluke_hpack::Decoder<'static>,
}

impl std::fmt::Debug for HpackDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackDecoder").finish()
    }
}

impl Default for HpackDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackDecoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Decoder::new(),
        }
    }

    /// Decode an HPACK-encoded header block. An empty block is an empty list.
    pub fn decode(&mut self, block: &[u8]) -> Result<Vec<HeaderField>, HeaderDecodeError> {
        let pairs = self
            .inner
            .decode(block)
            .map_err(|e| HeaderDecodeError(format!("{:?}", e)))?;
        Ok(pairs
            .into_iter()
            .map(|(name, value)| {
                HeaderField::new(
                    String::from_utf8_lossy(&name).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                )
            })
            .collect())
    }
}

/// HPACK encoder for outbound header blocks.
pub struct HpackEncoder {
    inner: fluke_hpack::Encoder<'static>,
}

impl std::fmt::Debug for HpackEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpackEncoder").finish()
    }
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackEncoder {
    pub fn new() -> Self {
        Self {
            inner: fluke_hpack::Encoder::new(),
        }
    }

    /// Encode fields, in order, into one header block.
    pub fn encode(&mut self, fields: &[HeaderField]) -> Vec<u8> {
        let pairs: Vec<(&[u8], &[u8])> = fields
            .iter()
            .map(|h| (h.name.as_bytes(), h.value.as_bytes()))
            .collect();
        self.inner.encode(pairs)
    }
}
