//! Shared error type across livelink crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, LiveLinkError>;

/// Unified error type used by the core codec and the client runtime.
#[derive(Debug, Error)]
pub enum LiveLinkError {
    /// I/O failure at the connection boundary (dial, read, write).
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Non-I/O failure in a framed transport layer (websocket protocol).
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport was closed locally or the peer went away cleanly.
    #[error("connection closed")]
    Closed,

    /// Unknown message type code on the wire.
    #[error("protocol error: unknown message type code {0}")]
    UnknownType(u16),

    /// Structurally invalid frame (bad lengths, non-UTF-8 content type).
    #[error("protocol error: {0}")]
    BadFrame(String),

    /// A frame field exceeds its wire-format bounds.
    #[error("frame too large: {0} bytes")]
    Oversize(usize),

    /// Content accessor used with the wrong content type.
    #[error("expected content type '{expected}' but was '{actual}'")]
    ContentType {
        /// Content type the accessor requires.
        expected: &'static str,
        /// Content type the message carries.
        actual: String,
    },

    /// Message content failed to deserialize.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// Supplied data failed to serialize during message construction.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}
