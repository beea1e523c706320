//! Room registry implementation
//!
//! The central registry that tracks which connections are in which room.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::protocol::{ConnId, RoomId};

use super::config::RegistryConfig;
use super::entry::{JoinOutcome, RoomEntry};
use super::error::RegistryError;
use super::participant::{Member, Outbox, Participant};

/// Exclusive access to one room, held while its members are notified
pub type RoomGuard = OwnedMutexGuard<RoomEntry>;

/// Result of removing a participant
#[derive(Debug)]
pub struct Departure {
    /// The participant that left
    pub participant: Participant,
    /// The room, still locked, if anyone remains in it
    pub room: Option<RoomGuard>,
}

/// Central registry for all rooms
///
/// The outer `RwLock` guards the room map; each room has its own `Mutex`.
/// Locks are always taken map first, then room. Rooms only exist while they
/// have members.
pub struct RoomRegistry {
    /// Map of room id to room entry
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<RoomEntry>>>>,

    /// Configuration
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Create a new room registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new room registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Add a participant to a room, creating the room if needed
    ///
    /// Returns the outcome together with the locked room so the caller can
    /// notify the other members before any other event touches the room.
    /// A connection that is already a member gets `JoinOutcome::AlreadyMember`
    /// and nothing changes.
    pub async fn join(
        &self,
        room_id: &RoomId,
        participant: Participant,
        outbox: Outbox,
    ) -> Result<(JoinOutcome, RoomGuard), RegistryError> {
        let mut rooms = self.rooms.write().await;

        let (entry_arc, created) = match rooms.get(room_id) {
            Some(entry) => (Arc::clone(entry), false),
            None => (
                Arc::new(Mutex::new(RoomEntry::new(room_id.clone()))),
                true,
            ),
        };

        // Lock the room before releasing the map so a concurrent leave
        // cannot drop it in between
        let mut room = Arc::clone(&entry_arc).lock_owned().await;

        let conn_id = participant.conn_id;
        let link_id = participant.link_id.clone();
        let outcome = room.admit(Member::new(participant, outbox), &self.config)?;

        if created {
            rooms.insert(room_id.clone(), entry_arc);
            tracing::info!(room = %room_id, "Room created");
        }
        drop(rooms);

        match outcome {
            JoinOutcome::Joined => tracing::info!(
                room = %room_id,
                conn_id = %conn_id,
                link_id = %link_id,
                members = room.len(),
                "Participant joined"
            ),
            JoinOutcome::AlreadyMember => tracing::debug!(
                room = %room_id,
                conn_id = %conn_id,
                "Duplicate join ignored"
            ),
        }

        Ok((outcome, room))
    }

    /// Remove a participant from a room
    ///
    /// Drops the room once it is empty. Returns `None` if the connection was
    /// not a member.
    pub async fn leave(&self, room_id: &RoomId, conn_id: ConnId) -> Option<Departure> {
        let mut rooms = self.rooms.write().await;

        let entry_arc = Arc::clone(rooms.get(room_id)?);
        let mut room = entry_arc.lock_owned().await;

        let member = room.evict(conn_id)?;
        let participant = member.participant;

        tracing::info!(
            room = %room_id,
            conn_id = %conn_id,
            link_id = %participant.link_id,
            members = room.len(),
            "Participant left"
        );

        if room.is_empty() {
            rooms.remove(room_id);
            tracing::info!(room = %room_id, "Room removed");
            return Some(Departure {
                participant,
                room: None,
            });
        }

        Some(Departure {
            participant,
            room: Some(room),
        })
    }

    /// Get a room's entry for fan-out outside of join/leave
    pub async fn room(&self, room_id: &RoomId) -> Option<Arc<Mutex<RoomEntry>>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Current participants of a room, in join order
    pub async fn members(&self, room_id: &RoomId) -> Vec<Participant> {
        match self.room(room_id).await {
            Some(entry) => entry.lock().await.participants().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Number of participants in a room (0 if the room does not exist)
    pub async fn member_count(&self, room_id: &RoomId) -> usize {
        match self.room(room_id).await {
            Some(entry) => entry.lock().await.len(),
            None => 0,
        }
    }

    /// Check if a connection is a member of a room
    pub async fn is_member(&self, room_id: &RoomId, conn_id: ConnId) -> bool {
        match self.room(room_id).await {
            Some(entry) => entry.lock().await.contains(conn_id),
            None => false,
        }
    }

    /// Check if a room exists
    pub async fn room_exists(&self, room_id: &RoomId) -> bool {
        self.rooms.read().await.contains_key(room_id)
    }

    /// Get total number of rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
