//! Signaling wire protocol
//!
//! Identifier types, the closed message enums exchanged between
//! participants and the server, and the newline-delimited JSON framing.

pub mod codec;
pub mod constants;
pub mod ids;
pub mod message;

pub use codec::{FrameCodec, FrameReader, FrameWriter};
pub use ids::{display_name_or_pseudonym, pseudonym, ConnId, LinkId, RoomId};
pub use message::{unix_millis, ChatMessage, ClientMessage, ServerMessage};
