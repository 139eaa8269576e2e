//! livelink client runtime.
//!
//! This crate wires the core message model to real connections:
//! - `transport`: the [`Transport`] contract plus the stream (TCP) and
//!   websocket implementations.
//! - `client`: the [`Client`] runtime with the Hello handshake, supervised
//!   read and heartbeat loops, and the incoming/errors consumer channels.
//!
//! It is intended to be embedded by applications; it never installs a tracing
//! subscriber, spawns nothing before a handshake succeeds, and has no
//! server-side or reconnect functionality.

pub mod client;
pub mod transport;

pub use client::{Client, HEARTBEAT_INTERVAL};
pub use transport::{StreamTransport, Transport, WsTransport};
