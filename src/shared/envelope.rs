//! Real-time Wire Envelopes
//!
//! Every WebSocket text frame is a JSON object with a `type` field.
//!
//! Inbound (client to server):
//!
//! ```json
//! {"type": "send_message", "room_id": 5, "content": "hello"}
//! ```
//!
//! Outbound (server to client) frames are [`ServerFrame`] values:
//!
//! - `{"type":"message","id":1,"room_id":5,"sender_id":7,"content":"hello","sent_at":"..."}`
//! - `{"type":"ack","message":"read received"}`
//! - `{"type":"error","message":"content required"}`
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::message::ChatMessage;

/// Inbound envelope as decoded from a client frame
///
/// Missing fields decode to their defaults, so `{"type":"read"}` is a
/// valid envelope and `{}` decodes to an envelope of unknown kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub room_id: i64,
    #[serde(default)]
    pub content: String,
}

impl Envelope {
    /// Decode a text frame
    ///
    /// # Example
    /// ```rust
    /// use roomchat::shared::{Envelope, EnvelopeKind};
    ///
    /// let envelope = Envelope::decode(r#"{"type":"join","room_id":3}"#).unwrap();
    /// assert_eq!(envelope.kind(), EnvelopeKind::Join);
    /// assert!(Envelope::decode("not json").is_err());
    /// ```
    pub fn decode(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn kind(&self) -> EnvelopeKind {
        EnvelopeKind::parse(&self.kind)
    }
}

/// Recognized inbound envelope types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    SendMessage,
    Read,
    Join,
    Leave,
    Unknown,
}

impl EnvelopeKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "send_message" => Self::SendMessage,
            "read" => Self::Read,
            "join" => Self::Join,
            "leave" => Self::Leave,
            _ => Self::Unknown,
        }
    }
}

/// Frame sent from the server to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A persisted chat message fanned out to the room
    Message(ChatMessage),
    /// Positive acknowledgement sent to one connection
    Ack { message: String },
    /// Error report sent to one connection
    Error { message: String },
}

impl ServerFrame {
    pub fn ack(message: impl Into<String>) -> Self {
        Self::Ack {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to the JSON text carried by a WebSocket frame
    pub fn encode(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<ChatMessage> for ServerFrame {
    fn from(message: ChatMessage) -> Self {
        Self::Message(message)
    }
}
