//! Signaling messages
//!
//! Both directions use closed enums tagged by a `type` field, so every
//! message kind is handled exhaustively by the dispatch code:
//!
//! ```text
//! client -> server   join-room        { room_id, link_id, name }
//!                    send-message     { room_id, text, name }
//!                    leave-room       { room_id }
//!
//! server -> client   user-connected   { link_id, name }
//!                    user-disconnected{ link_id, name }
//!                    receive-message  { sender_conn_id, name, text, timestamp }
//!                    error            { message }
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::ids::{ConnId, LinkId, RoomId};

/// Message sent by a participant to the signaling server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Enter a room under the given link identifier
    JoinRoom {
        room_id: RoomId,
        link_id: LinkId,
        name: String,
    },
    /// Chat text for everyone else in the room
    SendMessage {
        room_id: RoomId,
        text: String,
        name: String,
    },
    /// Leave the room without closing the connection
    LeaveRoom { room_id: RoomId },
}

impl ClientMessage {
    /// Wire name of this message kind
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom { .. } => "join-room",
            ClientMessage::SendMessage { .. } => "send-message",
            ClientMessage::LeaveRoom { .. } => "leave-room",
        }
    }
}

/// Message fanned out by the signaling server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// A participant joined the recipient's room
    UserConnected { link_id: LinkId, name: String },
    /// A participant left the recipient's room or lost its connection
    UserDisconnected { link_id: LinkId, name: String },
    /// Chat from another member of the room
    ReceiveMessage(ChatMessage),
    /// The server rejected the recipient's last request
    Error { message: String },
}

impl ServerMessage {
    /// Wire name of this message kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::UserConnected { .. } => "user-connected",
            ServerMessage::UserDisconnected { .. } => "user-disconnected",
            ServerMessage::ReceiveMessage(_) => "receive-message",
            ServerMessage::Error { .. } => "error",
        }
    }

    /// Create an error message
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// A chat line relayed between room members. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_conn_id: ConnId,
    pub name: String,
    pub text: String,
    /// Milliseconds since the Unix epoch, stamped when the server relays it
    pub timestamp: u64,
}

impl ChatMessage {
    /// Create a chat message stamped with the current time
    pub fn new(sender_conn_id: ConnId, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_conn_id,
            name: name.into(),
            text: text.into(),
            timestamp: unix_millis(),
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
