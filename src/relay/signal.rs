//! Signal relay implementation

use std::sync::Arc;

use crate::protocol::{ChatMessage, ConnId, RoomId, ServerMessage};
use crate::registry::{JoinOutcome, Outbox, Participant, RegistryError, RoomEntry, RoomRegistry};
use crate::stats::{RelayKind, RelaySnapshot, RelayStats};

/// Fans room events out to members
///
/// Best effort and at most once: a recipient whose connection is gone is
/// skipped, and nothing is retried or acknowledged.
pub struct SignalRelay {
    registry: Arc<RoomRegistry>,
    stats: RelayStats,
}

impl SignalRelay {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            stats: RelayStats::new(),
        }
    }

    /// Get a reference to the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Relay counters
    pub fn stats(&self) -> RelaySnapshot {
        self.stats.snapshot()
    }

    /// Admit a participant and announce it to the rest of the room
    ///
    /// The announcement is sent while the room is still locked. A duplicate
    /// join changes nothing and announces nothing.
    pub async fn join(
        &self,
        room_id: &RoomId,
        participant: Participant,
        outbox: Outbox,
    ) -> Result<JoinOutcome, RegistryError> {
        let announced = participant.clone();
        let (outcome, room) = self.registry.join(room_id, participant, outbox).await?;

        if outcome == JoinOutcome::Joined {
            self.broadcast_join(&room, &announced);
        }

        Ok(outcome)
    }

    /// Remove a participant and announce the departure to the remaining members
    ///
    /// Returns the participant that left, or `None` if it was not a member.
    pub async fn leave(&self, room_id: &RoomId, conn_id: ConnId) -> Option<Participant> {
        let departure = self.registry.leave(room_id, conn_id).await?;

        if let Some(room) = &departure.room {
            self.broadcast_leave(room, &departure.participant);
        }

        Some(departure.participant)
    }

    /// Send `user-connected` to every member of `room` except the new participant
    ///
    /// Takes the locked room, so it can only run after the participant was
    /// admitted. Returns the number of recipients reached.
    pub fn broadcast_join(&self, room: &RoomEntry, participant: &Participant) -> usize {
        let result = room.fan_out(Some(participant.conn_id), &participant.connected_message());
        self.stats
            .record(RelayKind::Join, result.delivered, result.dropped);

        tracing::debug!(
            room = %room.id(),
            link_id = %participant.link_id,
            recipients = result.delivered,
            dropped = result.dropped,
            "Join broadcast"
        );

        result.delivered
    }

    /// Send `user-disconnected` to every remaining member of `room`
    ///
    /// Returns the number of recipients reached.
    pub fn broadcast_leave(&self, room: &RoomEntry, participant: &Participant) -> usize {
        let result = room.fan_out(
            Some(participant.conn_id),
            &participant.disconnected_message(),
        );
        self.stats
            .record(RelayKind::Leave, result.delivered, result.dropped);

        tracing::debug!(
            room = %room.id(),
            link_id = %participant.link_id,
            recipients = result.delivered,
            dropped = result.dropped,
            "Leave broadcast"
        );

        result.delivered
    }

    /// Send a chat message to every member of the room except the sender
    ///
    /// The sender must be a member of the room. Returns the number of
    /// recipients reached.
    pub async fn relay_chat(
        &self,
        room_id: &RoomId,
        sender: ConnId,
        message: ChatMessage,
    ) -> Result<usize, RegistryError> {
        let entry = self
            .registry
            .room(room_id)
            .await
            .ok_or_else(|| RegistryError::NotMember(room_id.clone()))?;
        let room = entry.lock().await;

        if !room.contains(sender) {
            return Err(RegistryError::NotMember(room_id.clone()));
        }

        let result = room.fan_out(Some(sender), &ServerMessage::ReceiveMessage(message));
        self.stats
            .record(RelayKind::Chat, result.delivered, result.dropped);

        tracing::trace!(
            room = %room_id,
            conn_id = %sender,
            recipients = result.delivered,
            dropped = result.dropped,
            "Chat relayed"
        );

        Ok(result.delivered)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::protocol::LinkId;

    struct Peer {
        participant: Participant,
        outbox: Outbox,
        inbox: mpsc::UnboundedReceiver<ServerMessage>,
    }

    fn peer(conn: u64, link: &str, name: &str) -> Peer {
        let (outbox, inbox) = mpsc::unbounded_channel();
        Peer {
            participant: Participant::new(ConnId::new(conn), LinkId::from(link), name),
            outbox,
            inbox,
        }
    }

    fn drain(inbox: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = inbox.try_recv() {
            out.push(msg);
        }
        out
    }

    fn relay() -> SignalRelay {
        SignalRelay::new(Arc::new(RoomRegistry::new()))
    }

    async fn join(relay: &SignalRelay, room: &RoomId, peer: &Peer) -> JoinOutcome {
        relay
            .join(room, peer.participant.clone(), peer.outbox.clone())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_nth_join_reaches_n_minus_one() {
        let relay = relay();
        let room = RoomId::from("r1");
        let mut peers = Vec::new();

        for n in 1..=4u64 {
            let p = peer(n, &format!("p{}", n), "user");
            join(&relay, &room, &p).await;
            peers.push(p);
        }

        // Peer k hears about every later arrival, never about itself
        for (k, p) in peers.iter_mut().enumerate() {
            let received = drain(&mut p.inbox);
            assert_eq!(received.len(), 3 - k);
            assert!(received
                .iter()
                .all(|m| matches!(m, ServerMessage::UserConnected { .. })));
        }

        let snapshot = relay.stats();
        assert_eq!(snapshot.joins, 4);
        assert_eq!(snapshot.delivered, 6);
        assert_eq!(relay.registry().member_count(&room).await, 4);
    }

    #[tokio::test]
    async fn test_rejoin_sends_no_fresh_notification() {
        let relay = relay();
        let room = RoomId::from("r1");
        let mut a = peer(1, "a1", "A");
        let b = peer(2, "b1", "B");

        join(&relay, &room, &a).await;
        join(&relay, &room, &b).await;
        assert_eq!(drain(&mut a.inbox).len(), 1);

        assert_eq!(join(&relay, &room, &b).await, JoinOutcome::AlreadyMember);
        assert!(drain(&mut a.inbox).is_empty());
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining_members_once() {
        let relay = relay();
        let room = RoomId::from("r1");
        let mut a = peer(1, "a1", "A");
        let mut b = peer(2, "b1", "B");
        let mut c = peer(3, "c1", "C");

        join(&relay, &room, &a).await;
        join(&relay, &room, &b).await;
        join(&relay, &room, &c).await;
        drain(&mut a.inbox);
        drain(&mut b.inbox);

        let left = relay.leave(&room, ConnId::new(2)).await.unwrap();
        assert_eq!(left.link_id, LinkId::from("b1"));

        let expected = ServerMessage::UserDisconnected {
            link_id: LinkId::from("b1"),
            name: "B".into(),
        };
        assert_eq!(drain(&mut a.inbox), vec![expected.clone()]);
        assert_eq!(drain(&mut c.inbox), vec![expected]);
        assert!(drain(&mut b.inbox).is_empty());
        assert_eq!(relay.registry().member_count(&room).await, 2);

        // Second leave is a no-op
        assert!(relay.leave(&room, ConnId::new(2)).await.is_none());
        assert!(drain(&mut a.inbox).is_empty());
    }

    #[tokio::test]
    async fn test_chat_excludes_sender() {
        let relay = relay();
        let room = RoomId::from("r1");
        let mut a = peer(1, "a1", "A");
        let mut b = peer(2, "b1", "B");
        let mut c = peer(3, "c1", "C");

        join(&relay, &room, &a).await;
        join(&relay, &room, &b).await;
        join(&relay, &room, &c).await;
        drain(&mut a.inbox);
        drain(&mut b.inbox);

        let msg = ChatMessage::new(ConnId::new(1), "A", "hi");
        let reached = relay.relay_chat(&room, ConnId::new(1), msg).await.unwrap();
        assert_eq!(reached, 2);

        for inbox in [&mut b.inbox, &mut c.inbox] {
            let received = drain(inbox);
            assert_eq!(received.len(), 1);
            match &received[0] {
                ServerMessage::ReceiveMessage(chat) => {
                    assert_eq!(chat.text, "hi");
                    assert_eq!(chat.sender_conn_id, ConnId::new(1));
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }
        assert!(drain(&mut a.inbox).is_empty());
    }

    #[tokio::test]
    async fn test_chat_from_non_member_rejected() {
        let relay = relay();
        let room = RoomId::from("r1");
        let a = peer(1, "a1", "A");
        join(&relay, &room, &a).await;

        let msg = ChatMessage::new(ConnId::new(9), "X", "spam");
        let result = relay.relay_chat(&room, ConnId::new(9), msg.clone()).await;
        assert_eq!(result, Err(RegistryError::NotMember(room.clone())));

        let missing = RoomId::from("nowhere");
        let result = relay.relay_chat(&missing, ConnId::new(9), msg).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dead_recipient_is_dropped() {
        let relay = relay();
        let room = RoomId::from("r1");
        let a = peer(1, "a1", "A");
        let mut b = peer(2, "b1", "B");

        join(&relay, &room, &a).await;
        drop(a.inbox);
        join(&relay, &room, &b).await;

        assert_eq!(relay.stats().dropped, 1);
        assert!(drain(&mut b.inbox).is_empty());
    }

    #[tokio::test]
    async fn test_events_arrive_in_broadcast_order() {
        let relay = relay();
        let room = RoomId::from("r1");
        let mut a = peer(1, "a1", "A");
        let b = peer(2, "b1", "B");

        join(&relay, &room, &a).await;
        join(&relay, &room, &b).await;
        for text in ["one", "two", "three"] {
            let msg = ChatMessage::new(ConnId::new(2), "B", text);
            relay.relay_chat(&room, ConnId::new(2), msg).await.unwrap();
        }
        relay.leave(&room, ConnId::new(2)).await;

        let kinds: Vec<_> = drain(&mut a.inbox)
            .into_iter()
            .map(|m| match m {
                ServerMessage::ReceiveMessage(chat) => chat.text,
                other => other.kind().to_string(),
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["user-connected", "one", "two", "three", "user-disconnected"]
        );
    }
}
