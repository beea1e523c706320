//! Room invites
//!
//! A new room is just a fresh identifier: the room itself only comes into
//! existence when its first participant joins.

use serde::{Deserialize, Serialize};

use crate::protocol::RoomId;

/// Response body for room creation: the new id and a shareable link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInvite {
    pub room_id: RoomId,
    pub room_link: String,
}

impl RoomInvite {
    /// Build an invite for an existing room id
    pub fn new(host: &str, room_id: RoomId) -> Self {
        let room_link = format!("{}/{}", host.trim_end_matches('/'), room_id);
        Self { room_id, room_link }
    }

    /// Allocate a new room id and build its invite
    pub fn create(host: &str) -> Self {
        Self::new(host, RoomId::generate())
    }
}
