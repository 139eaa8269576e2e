//! Binary wire codec for stream transports (panic-free).
//!
//! Frame layout, all integers big-endian:
//! - `u16` type code (Ping=0, Pong=1, Hello=2, Goodbye=3, Message=10)
//! - content-bearing types only (Hello, Message):
//!   `u16` content-type length, content-type bytes (UTF-8),
//!   `i32` content length, content bytes
//!
//! Control frames are exactly 2 bytes.
//!
//! Parsing rules:
//! - Never index (`buf[0]`) — always use `Buf` and `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{LiveLinkError, Result};
use crate::message::{Message, MessageType};

/// Wire size of a control frame (type code only).
pub const CONTROL_FRAME_LEN: usize = 2;

/// Encode one message into `buf` as a single frame.
pub fn encode(message: &Message, buf: &mut BytesMut) -> Result<()> {
    buf.put_u16(message.message_type().code());
    if !message.message_type().has_content() {
        return Ok(());
    }

    let content_type = message.content_type().as_bytes();
    let Ok(ct_len) = u16::try_from(content_type.len()) else {
        return Err(LiveLinkError::Oversize(content_type.len()));
    };
    let Ok(content_len) = i32::try_from(message.content_length()) else {
        return Err(LiveLinkError::Oversize(message.content_length()));
    };

    buf.reserve(2 + content_type.len() + 4 + message.content_length());
    buf.put_u16(ct_len);
    buf.put_slice(content_type);
    buf.put_i32(content_len);
    buf.put_slice(message.content());
    Ok(())
}

/// Decode at most one frame from the front of `buf`.
///
/// Returns `Ok(None)` without consuming anything when `buf` does not yet hold
/// a complete frame; returns `Ok(Some(_))` after consuming exactly one frame.
/// A short read therefore never truncates a message; decode only succeeds
/// once every byte of the frame has arrived.
///
/// Decode errors consume the header bytes examined so far, so a reader can
/// report the error and keep going instead of re-hitting the same bytes.
pub fn decode(buf: &mut BytesMut) -> Result<Option<Message>> {
    // Peek over a slice first so partial frames leave `buf` untouched.
    let mut peek: &[u8] = &buf[..];

    if peek.remaining() < 2 {
        return Ok(None);
    }
    let message_type = match MessageType::from_code(peek.get_u16()) {
        Ok(t) => t,
        Err(err) => {
            tracing::debug!(error = %err, "discarding unrecognized type code");
            buf.advance(2);
            return Err(err);
        }
    };

    if !message_type.has_content() {
        buf.advance(CONTROL_FRAME_LEN);
        return Ok(Some(Message::control(message_type)));
    }

    if peek.remaining() < 2 {
        return Ok(None);
    }
    let ct_len = peek.get_u16() as usize;
    if peek.remaining() < ct_len {
        return Ok(None);
    }
    let content_type = match std::str::from_utf8(&peek[..ct_len]) {
        Ok(s) => s.to_string(),
        Err(_) => {
            buf.advance(2 + 2 + ct_len);
            return Err(LiveLinkError::BadFrame("content type is not UTF-8".into()));
        }
    };
    peek.advance(ct_len);

    if peek.remaining() < 4 {
        return Ok(None);
    }
    let content_len = peek.get_i32();
    let Ok(content_len) = usize::try_from(content_len) else {
        buf.advance(2 + 2 + ct_len + 4);
        return Err(LiveLinkError::BadFrame(format!(
            "negative content length {content_len}"
        )));
    };
    if peek.remaining() < content_len {
        return Ok(None);
    }

    // Complete frame: consume the header, then split the content off zero-copy.
    buf.advance(2 + 2 + ct_len + 4);
    let content = buf.split_to(content_len).freeze();
    Ok(Some(Message::from_wire(message_type, content_type, content)))
}
