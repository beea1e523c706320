//! Registry error types
//!
//! Error types for room membership operations.

use crate::protocol::{LinkId, RoomId};

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Room already holds the configured maximum of participants
    RoomFull(RoomId),
    /// Another member of the room already uses this link identifier
    DuplicateLinkId(RoomId, LinkId),
    /// Connection is not a member of the room
    NotMember(RoomId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::RoomFull(room) => write!(f, "Room is full: {}", room),
            RegistryError::DuplicateLinkId(room, link) => {
                write!(f, "Link id {} already present in room {}", link, room)
            }
            RegistryError::NotMember(room) => write!(f, "Not a member of room {}", room),
        }
    }
}

impl std::error::Error for RegistryError {}
