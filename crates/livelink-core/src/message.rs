//! Protocol message model.
//!
//! `Message` is an immutable value type: constructed once (or decoded off the
//! wire) and never mutated. Content length is always derived from the content
//! buffer, so the length/content invariant cannot be violated.

use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{LiveLinkError, Result};

/// Content type tag for JSON payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type tag for opaque binary payloads.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Protocol message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Handshake, sent once by the client at connection start.
    Hello,
    /// Heartbeat request.
    Ping,
    /// Heartbeat reply.
    Pong,
    /// Application payload.
    Message,
    /// Peer is going away.
    Goodbye,
}

impl MessageType {
    /// Wire type code (big-endian u16 on stream transports).
    pub fn code(self) -> u16 {
        match self {
            MessageType::Ping => 0,
            MessageType::Pong => 1,
            MessageType::Hello => 2,
            MessageType::Goodbye => 3,
            MessageType::Message => 10,
        }
    }

    /// Inverse of [`code`](Self::code); anything else is a protocol error.
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            0 => Ok(MessageType::Ping),
            1 => Ok(MessageType::Pong),
            2 => Ok(MessageType::Hello),
            3 => Ok(MessageType::Goodbye),
            10 => Ok(MessageType::Message),
            other => Err(LiveLinkError::UnknownType(other)),
        }
    }

    /// Whether frames of this type carry a content-type and content section.
    pub fn has_content(self) -> bool {
        matches!(self, MessageType::Hello | MessageType::Message)
    }
}

/// Handshake payload carried as JSON content of a Hello message.
///
/// Field names are part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Opaque client identifier.
    #[serde(rename = "ClientID")]
    pub client_id: String,
    /// Opaque host label.
    #[serde(rename = "Host")]
    pub host: String,
}

/// One protocol message. Immutable after construction or decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    message_type: MessageType,
    content_type: String,
    content: Bytes,
}

impl Message {
    /// Handshake message with a JSON `{ClientID, Host}` payload.
    pub fn hello(client_id: impl Into<String>, host: impl Into<String>) -> Message {
        let payload = Hello {
            client_id: client_id.into(),
            host: host.into(),
        };
        // Serializing two plain strings cannot fail; an empty body would only
        // occur if serde_json itself were broken.
        let content = serde_json::to_vec(&payload).unwrap_or_default();
        Message {
            message_type: MessageType::Hello,
            content_type: CONTENT_TYPE_JSON.to_string(),
            content: Bytes::from(content),
        }
    }

    /// Application message with JSON-serialized content.
    pub fn json<T: Serialize>(data: &T) -> Result<Message> {
        let content = serde_json::to_vec(data).map_err(LiveLinkError::Encode)?;
        Ok(Message {
            message_type: MessageType::Message,
            content_type: CONTENT_TYPE_JSON.to_string(),
            content: Bytes::from(content),
        })
    }

    /// Application message with an arbitrary content type.
    pub fn with_content(content_type: impl Into<String>, content: impl Into<Bytes>) -> Message {
        Message {
            message_type: MessageType::Message,
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Zero-content heartbeat request.
    pub fn ping() -> Message {
        Message::control(MessageType::Ping)
    }

    /// Zero-content heartbeat reply.
    pub fn pong() -> Message {
        Message::control(MessageType::Pong)
    }

    /// Zero-content close notification.
    pub fn goodbye() -> Message {
        Message::control(MessageType::Goodbye)
    }

    pub(crate) fn control(message_type: MessageType) -> Message {
        Message {
            message_type,
            content_type: String::new(),
            content: Bytes::new(),
        }
    }

    pub(crate) fn from_wire(
        message_type: MessageType,
        content_type: String,
        content: Bytes,
    ) -> Message {
        Message {
            message_type,
            content_type,
            content,
        }
    }

    /// Message kind.
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Semantic content tag; empty for control messages.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Payload bytes; empty for control messages.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Byte count of the content, as written on the wire.
    pub fn content_length(&self) -> usize {
        self.content.len()
    }

    /// Deserialize JSON content into `T`.
    ///
    /// Fails with [`LiveLinkError::ContentType`] unless the message is tagged
    /// `application/json`, and with [`LiveLinkError::Decode`] on malformed
    /// JSON. Errors are returned to the caller directly, never routed through
    /// a client's errors channel.
    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.content_type != CONTENT_TYPE_JSON {
            return Err(LiveLinkError::ContentType {
                expected: CONTENT_TYPE_JSON,
                actual: self.content_type.clone(),
            });
        }
        serde_json::from_slice(&self.content).map_err(LiveLinkError::Decode)
    }
}
