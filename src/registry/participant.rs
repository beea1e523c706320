//! Participant and member types
//!
//! A `Participant` is the identity the rest of the room sees. A `Member` is
//! the registry's record of it: the participant plus the outbox used to
//! reach its connection.

use std::time::Instant;

use tokio::sync::mpsc;

use crate::protocol::{display_name_or_pseudonym, ConnId, LinkId, ServerMessage};

/// Channel feeding a connection's writer task
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// A connected user as seen by the room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Transport connection identifier
    pub conn_id: ConnId,
    /// Identifier the negotiation library uses for this participant
    pub link_id: LinkId,
    /// Display name (never empty)
    pub name: String,
    /// When the participant joined its room
    pub joined_at: Instant,
}

impl Participant {
    /// Create a participant, replacing a blank name with a pseudonym
    pub fn new(conn_id: ConnId, link_id: LinkId, name: &str) -> Self {
        Self {
            conn_id,
            link_id,
            name: display_name_or_pseudonym(name),
            joined_at: Instant::now(),
        }
    }

    /// Notification announcing this participant's arrival
    pub fn connected_message(&self) -> ServerMessage {
        ServerMessage::UserConnected {
            link_id: self.link_id.clone(),
            name: self.name.clone(),
        }
    }

    /// Notification announcing this participant's departure
    pub fn disconnected_message(&self) -> ServerMessage {
        ServerMessage::UserDisconnected {
            link_id: self.link_id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Registry record for one room member
#[derive(Debug, Clone)]
pub struct Member {
    pub participant: Participant,
    pub(super) outbox: Outbox,
}

impl Member {
    pub fn new(participant: Participant, outbox: Outbox) -> Self {
        Self {
            participant,
            outbox,
        }
    }

    /// Queue a message for this member's connection
    ///
    /// Returns false if the connection's writer is gone.
    pub(super) fn deliver(&self, msg: ServerMessage) -> bool {
        self.outbox.send(msg).is_ok()
    }
}
