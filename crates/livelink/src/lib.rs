//! Top-level facade crate for livelink.
//!
//! Re-exports the core protocol types and the client runtime so users can
//! depend on a single crate.

pub mod core {
    pub use livelink_core::*;
}

pub mod client {
    pub use livelink_client::*;
}

pub use livelink_client::{Client, StreamTransport, Transport, WsTransport, HEARTBEAT_INTERVAL};
pub use livelink_core::{Hello, LiveLinkError, Message, MessageType, Result};
