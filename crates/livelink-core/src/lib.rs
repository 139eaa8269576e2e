//! livelink core: protocol message model, binary wire codec, and error types.
//!
//! This crate defines the wire-level contracts and error surface shared by the
//! client runtime and any tooling that speaks the protocol. It intentionally
//! carries no transport or runtime dependencies so it can be reused in
//! multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `LiveLinkError`/`Result` so embedding
//! processes do not crash on malformed input or bad traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod message;

/// Shared result type.
pub use error::{LiveLinkError, Result};
pub use message::{Hello, Message, MessageType, CONTENT_TYPE_JSON, CONTENT_TYPE_OCTET_STREAM};
