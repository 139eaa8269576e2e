//! Transport contract and implementations.
//!
//! A [`Transport`] exclusively owns one underlying connection and is not
//! reusable after `close`. Methods take `&self`: implementations carry their
//! own internal synchronization, and writes from concurrent tasks are
//! serialized so partial frames can never interleave on the wire.

use async_trait::async_trait;

use livelink_core::{Message, Result};

pub mod stream;
pub mod ws;

pub use stream::StreamTransport;
pub use ws::WsTransport;

/// Capability contract every connection variant must satisfy.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short transport name ("tcp", "ws", ...), used in logs.
    fn name(&self) -> &'static str;

    /// Write one message as a single frame. Serialized internally: a
    /// concurrent caller waits rather than interleaving bytes mid-frame.
    async fn write_message(&self, message: Message) -> Result<()>;

    /// Read the next message, awaiting until one arrives, the connection
    /// fails, or the transport is closed.
    async fn read_message(&self) -> Result<Message>;

    /// Close the underlying connection. Further reads and writes fail with
    /// [`livelink_core::LiveLinkError::Closed`].
    async fn close(&self) -> Result<()>;
}
