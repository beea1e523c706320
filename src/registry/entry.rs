//! Room entry
//!
//! Per-room membership stored in the registry. All access goes through the
//! room's mutex, so membership changes and the fan-out that follows them are
//! never interleaved with another event on the same room.

use std::time::Instant;

use crate::protocol::{ConnId, RoomId, ServerMessage};

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::participant::{Member, Participant};

/// Result of a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Participant was added to the room
    Joined,
    /// Connection was already a member; nothing changed
    AlreadyMember,
}

/// Outcome of fanning a message out to a room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Recipients whose outbox accepted the message
    pub delivered: usize,
    /// Recipients whose connection was already gone
    pub dropped: usize,
}

/// Entry for a single room in the registry
#[derive(Debug)]
pub struct RoomEntry {
    id: RoomId,

    /// Members in join order
    members: Vec<Member>,

    /// When the room was created
    pub created_at: Instant,
}

impl RoomEntry {
    pub(super) fn new(id: RoomId) -> Self {
        Self {
            id,
            members: Vec::new(),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Number of current members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a connection is a member
    pub fn contains(&self, conn_id: ConnId) -> bool {
        self.members
            .iter()
            .any(|m| m.participant.conn_id == conn_id)
    }

    /// Look up a member's participant record
    pub fn participant(&self, conn_id: ConnId) -> Option<&Participant> {
        self.members
            .iter()
            .map(|m| &m.participant)
            .find(|p| p.conn_id == conn_id)
    }

    /// Participants in join order
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.members.iter().map(|m| &m.participant)
    }

    /// Add a member
    ///
    /// A connection that is already a member is left untouched.
    pub(super) fn admit(
        &mut self,
        member: Member,
        config: &RegistryConfig,
    ) -> Result<JoinOutcome, RegistryError> {
        let participant = &member.participant;

        if self.contains(participant.conn_id) {
            return Ok(JoinOutcome::AlreadyMember);
        }

        if self
            .participants()
            .any(|p| p.link_id == participant.link_id)
        {
            return Err(RegistryError::DuplicateLinkId(
                self.id.clone(),
                participant.link_id.clone(),
            ));
        }

        if !config.has_capacity(self.members.len()) {
            return Err(RegistryError::RoomFull(self.id.clone()));
        }

        self.members.push(member);
        Ok(JoinOutcome::Joined)
    }

    /// Remove a member, returning its record
    pub(super) fn evict(&mut self, conn_id: ConnId) -> Option<Member> {
        let index = self
            .members
            .iter()
            .position(|m| m.participant.conn_id == conn_id)?;
        Some(self.members.remove(index))
    }

    /// Queue `msg` for every member except `except`
    ///
    /// Sends never block. A member whose writer has gone away is counted as
    /// dropped and otherwise ignored.
    pub(crate) fn fan_out(&self, except: Option<ConnId>, msg: &ServerMessage) -> FanOut {
        let mut result = FanOut::default();

        for member in &self.members {
            if Some(member.participant.conn_id) == except {
                continue;
            }
            if member.deliver(msg.clone()) {
                result.delivered += 1;
            } else {
                result.dropped += 1;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::protocol::LinkId;

    fn member(conn: u64, link: &str) -> (Member, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let participant = Participant::new(ConnId::new(conn), LinkId::from(link), "user");
        (Member::new(participant, tx), rx)
    }

    #[test]
    fn test_admit_and_evict() {
        let config = RegistryConfig::default();
        let mut room = RoomEntry::new(RoomId::from("r1"));

        let (a, _rx_a) = member(1, "a1");
        assert_eq!(room.admit(a.clone(), &config), Ok(JoinOutcome::Joined));
        assert_eq!(room.admit(a, &config), Ok(JoinOutcome::AlreadyMember));
        assert_eq!(room.len(), 1);

        assert!(room.evict(ConnId::new(1)).is_some());
        assert!(room.evict(ConnId::new(1)).is_none());
        assert!(room.is_empty());
    }

    #[test]
    fn test_duplicate_link_id_rejected() {
        let config = RegistryConfig::default();
        let mut room = RoomEntry::new(RoomId::from("r1"));

        let (a, _rx_a) = member(1, "a1");
        let (b, _rx_b) = member(2, "a1");
        room.admit(a, &config).unwrap();

        assert!(matches!(
            room.admit(b, &config),
            Err(RegistryError::DuplicateLinkId(_, _))
        ));
    }

    #[test]
    fn test_fan_out_skips_sender_and_counts_dropped() {
        let config = RegistryConfig::default();
        let mut room = RoomEntry::new(RoomId::from("r1"));

        let (a, mut rx_a) = member(1, "a1");
        let (b, mut rx_b) = member(2, "b1");
        let (c, rx_c) = member(3, "c1");
        room.admit(a, &config).unwrap();
        room.admit(b, &config).unwrap();
        room.admit(c, &config).unwrap();
        drop(rx_c);

        let result = room.fan_out(Some(ConnId::new(1)), &ServerMessage::error("x"));
        assert_eq!(result, FanOut { delivered: 1, dropped: 1 });
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), ServerMessage::error("x"));
    }
}
