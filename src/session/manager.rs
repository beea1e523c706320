//! Peer link manager
//!
//! Turns relay notifications and negotiation callbacks into link state
//! changes and surface updates:
//!
//! ```text
//!                user-connected            remote stream
//!   Absent ─────────────────────► Negotiating ──────────► Established
//!      │     incoming link request     │                      │
//!      └──────────────────────────────►│                      │
//!                                      │ user-disconnected    │
//!                                      │ or link closed       │
//!                                      └──────────► Closed ◄──┘
//! ```
//!
//! A closed link is removed from the session together with its surface, so
//! a later join under the same link identifier starts from `Absent` again.

use super::link::{LinkDirection, PeerLink};
use super::media::StreamId;
use super::negotiator::{LinkMetadata, NegotiationEvent, Negotiator};
use super::state::ConnectionSession;
use super::surface::{SurfaceChange, SurfaceGrid};
use crate::error::LinkError;
use crate::protocol::constants::FALLBACK_PEER_LABEL;
use crate::protocol::LinkId;

/// Drives the links of one local participant
pub struct PeerLinkManager<N: Negotiator> {
    session: ConnectionSession,
    negotiator: N,
    surfaces: SurfaceGrid,
}

impl<N: Negotiator> PeerLinkManager<N> {
    /// Create a manager; the local stream, if any, gets a muted surface
    pub fn new(session: ConnectionSession, negotiator: N) -> Self {
        let mut surfaces = SurfaceGrid::new();
        if let Some(media) = session.local_media_handle() {
            surfaces.attach(
                session.own_link_id(),
                media.id().clone(),
                session.display_name(),
                true,
            );
        }

        Self {
            session,
            negotiator,
            surfaces,
        }
    }

    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    pub fn surfaces(&self) -> &SurfaceGrid {
        &self.surfaces
    }

    pub fn negotiator(&self) -> &N {
        &self.negotiator
    }

    /// A participant joined the room: initiate an outbound link
    ///
    /// Requires local media. A notification about ourselves, or about a
    /// participant we already have a link with, changes nothing.
    pub fn on_user_connected(&mut self, link_id: &LinkId, name: &str) -> Result<(), LinkError> {
        if link_id == self.session.own_link_id() || self.session.link(link_id).is_some() {
            return Ok(());
        }

        let media = self
            .session
            .local_media_handle()
            .ok_or(LinkError::NoLocalMedia)?;

        let metadata = LinkMetadata {
            name: self.session.display_name().to_string(),
        };
        self.negotiator.initiate_link(link_id, media, metadata)?;

        let remote_name = Some(name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.session.links_mut().insert(
            link_id.clone(),
            PeerLink::new(link_id.clone(), LinkDirection::Outbound, remote_name),
        );

        tracing::debug!(link_id = %link_id, "Outbound link negotiating");
        Ok(())
    }

    /// A remote asked for a link: answer it
    ///
    /// Answered receive-only when there is no local media. A request under
    /// our own link identifier is ignored.
    pub fn on_incoming_link(
        &mut self,
        link_id: &LinkId,
        metadata: Option<LinkMetadata>,
    ) -> Result<(), LinkError> {
        if link_id == self.session.own_link_id() {
            tracing::warn!(link_id = %link_id, "Ignoring link request under our own id");
            return Ok(());
        }
        if self.session.link(link_id).is_some() {
            tracing::debug!(link_id = %link_id, "Ignoring duplicate link request");
            return Ok(());
        }

        self.negotiator
            .answer_link(link_id, self.session.local_media_handle())?;

        let remote_name = metadata
            .map(|m| m.name)
            .filter(|n| !n.trim().is_empty());
        self.session.links_mut().insert(
            link_id.clone(),
            PeerLink::new(link_id.clone(), LinkDirection::Inbound, remote_name),
        );

        tracing::debug!(link_id = %link_id, "Inbound link negotiating");
        Ok(())
    }

    /// Media arrived on a link
    ///
    /// The first stream establishes the link and creates its surface; later
    /// streams replace the stream on the same surface. Streams for unknown
    /// links are dropped.
    pub fn on_remote_stream(&mut self, link_id: &LinkId, stream: StreamId) -> Option<SurfaceChange> {
        let Some(link) = self.session.links_mut().get_mut(link_id) else {
            tracing::trace!(link_id = %link_id, "Stream for unknown link dropped");
            return None;
        };

        if !link.establish(stream.clone()) {
            return None;
        }

        let label = link
            .remote_name
            .clone()
            .unwrap_or_else(|| FALLBACK_PEER_LABEL.to_string());
        let change = self.surfaces.attach(link_id, stream, &label, false);

        tracing::debug!(link_id = %link_id, change = ?change, "Link established");
        Some(change)
    }

    /// The negotiation library closed a link
    ///
    /// Returns the closed link, or `None` if there was none.
    pub fn on_link_closed(&mut self, link_id: &LinkId) -> Option<PeerLink> {
        let mut link = self.session.links_mut().remove(link_id)?;
        link.close();
        self.surfaces.remove(link_id);

        tracing::debug!(link_id = %link_id, "Link closed");
        Some(link)
    }

    /// A participant left the room: close our link to it
    pub fn on_user_disconnected(&mut self, link_id: &LinkId) -> Option<PeerLink> {
        if self.session.link(link_id).is_none() {
            return None;
        }

        self.negotiator.close_link(link_id);
        self.on_link_closed(link_id)
    }

    /// Dispatch a callback from the negotiation library
    pub fn handle_negotiation_event(&mut self, event: NegotiationEvent) -> Result<(), LinkError> {
        match event {
            NegotiationEvent::IncomingLink { link_id, metadata } => {
                self.on_incoming_link(&link_id, metadata)
            }
            NegotiationEvent::RemoteStream { link_id, stream } => {
                self.on_remote_stream(&link_id, stream);
                Ok(())
            }
            NegotiationEvent::LinkClosed { link_id } => {
                self.on_link_closed(&link_id);
                Ok(())
            }
        }
    }

    /// Close every link, leaving only the local surface
    pub fn close_all(&mut self) -> usize {
        let remotes: Vec<LinkId> = self.session.links_mut().keys().cloned().collect();
        for link_id in &remotes {
            self.negotiator.close_link(link_id);
            self.on_link_closed(link_id);
        }
        remotes.len()
    }

    /// Flip local video. `None` without local media.
    pub fn toggle_video(&self) -> Option<bool> {
        self.session.local_media_handle().map(|m| m.toggle_video())
    }

    /// Flip local audio. `None` without local media.
    pub fn toggle_audio(&self) -> Option<bool> {
        self.session.local_media_handle().map(|m| m.toggle_audio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::link::LinkState;
    use crate::session::media::MediaHandle;
    use crate::session::surface::GridLayout;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Initiate(LinkId, String),
        Answer(LinkId, bool),
        Close(LinkId),
    }

    #[derive(Default)]
    struct RecordingNegotiator {
        calls: Vec<Call>,
        refuse: bool,
    }

    impl Negotiator for RecordingNegotiator {
        fn initiate_link(
            &mut self,
            remote: &LinkId,
            _local_media: &MediaHandle,
            metadata: LinkMetadata,
        ) -> Result<(), LinkError> {
            if self.refuse {
                return Err(LinkError::Negotiation {
                    link_id: remote.clone(),
                    reason: "refused".into(),
                });
            }
            self.calls.push(Call::Initiate(remote.clone(), metadata.name));
            Ok(())
        }

        fn answer_link(
            &mut self,
            remote: &LinkId,
            local_media: Option<&MediaHandle>,
        ) -> Result<(), LinkError> {
            self.calls
                .push(Call::Answer(remote.clone(), local_media.is_some()));
            Ok(())
        }

        fn close_link(&mut self, remote: &LinkId) {
            self.calls.push(Call::Close(remote.clone()));
        }
    }

    fn manager(own: &str, name: &str) -> PeerLinkManager<RecordingNegotiator> {
        let session = ConnectionSession::new(LinkId::from(own), name)
            .with_local_media(MediaHandle::audio_video(format!("{}-local", own)));
        PeerLinkManager::new(session, RecordingNegotiator::default())
    }

    #[test]
    fn test_local_surface_is_muted() {
        let m = manager("a1", "Alice");

        let own = m.surfaces().get(&LinkId::from("a1")).unwrap();
        assert!(own.muted);
        assert_eq!(own.label, "Alice");
        assert_eq!(m.surfaces().layout(), GridLayout::Single);
    }

    #[test]
    fn test_user_connected_initiates_outbound_link() {
        let mut m = manager("a1", "Alice");
        let b1 = LinkId::from("b1");

        m.on_user_connected(&b1, "Bob").unwrap();
        m.on_user_connected(&b1, "Bob").unwrap();
        m.on_user_connected(&LinkId::from("a1"), "Alice").unwrap();

        assert_eq!(
            m.negotiator().calls,
            vec![Call::Initiate(b1.clone(), "Alice".into())]
        );
        let link = m.session().link(&b1).unwrap();
        assert_eq!(link.direction, LinkDirection::Outbound);
        assert_eq!(link.state, LinkState::Negotiating);
    }

    #[test]
    fn test_outbound_requires_local_media() {
        let session = ConnectionSession::new(LinkId::from("a1"), "Alice");
        let mut m = PeerLinkManager::new(session, RecordingNegotiator::default());

        let result = m.on_user_connected(&LinkId::from("b1"), "Bob");
        assert_eq!(result, Err(LinkError::NoLocalMedia));
        assert_eq!(m.session().link_count(), 0);
        assert!(m.surfaces().is_empty());

        // Receive-only answer still works
        m.on_incoming_link(&LinkId::from("c1"), None).unwrap();
        assert_eq!(
            m.negotiator().calls,
            vec![Call::Answer(LinkId::from("c1"), false)]
        );
        assert_eq!(m.toggle_video(), None);
    }

    #[test]
    fn test_refused_negotiation_leaves_no_link() {
        let mut m = manager("a1", "Alice");
        m.negotiator.refuse = true;

        let result = m.on_user_connected(&LinkId::from("b1"), "Bob");
        assert!(matches!(result, Err(LinkError::Negotiation { .. })));
        assert!(m.session().link(&LinkId::from("b1")).is_none());
    }

    #[test]
    fn test_two_streams_one_surface() {
        let mut m = manager("a1", "Alice");
        let b1 = LinkId::from("b1");
        m.on_user_connected(&b1, "Bob").unwrap();

        assert_eq!(
            m.on_remote_stream(&b1, StreamId::from("s1")),
            Some(SurfaceChange::Created)
        );
        assert_eq!(
            m.on_remote_stream(&b1, StreamId::from("s2")),
            Some(SurfaceChange::Updated)
        );

        assert_eq!(m.surfaces().len(), 2);
        let surface = m.surfaces().get(&b1).unwrap();
        assert_eq!(surface.stream, StreamId::from("s2"));
        assert_eq!(surface.label, "Bob");
        assert!(!surface.muted);
        assert_eq!(m.surfaces().layout(), GridLayout::Multi);
    }

    #[test]
    fn test_request_under_own_id_leaves_local_surface() {
        let mut m = manager("a1", "Alice");
        let a1 = LinkId::from("a1");

        m.on_incoming_link(&a1, Some(LinkMetadata { name: "Mallory".into() }))
            .unwrap();
        assert_eq!(m.on_remote_stream(&a1, StreamId::from("foreign")), None);
        assert!(m.on_link_closed(&a1).is_none());

        assert!(m.negotiator().calls.is_empty());
        assert_eq!(m.session().link_count(), 0);
        let own = m.surfaces().get(&a1).unwrap();
        assert_eq!(own.stream, StreamId::from("a1-local"));
        assert!(own.muted);
    }

    #[test]
    fn test_stream_for_unknown_link_is_dropped() {
        let mut m = manager("a1", "Alice");

        assert_eq!(m.on_remote_stream(&LinkId::from("x9"), StreamId::from("s1")), None);
        assert_eq!(m.surfaces().len(), 1);
    }

    #[test]
    fn test_inbound_link_uses_metadata_label() {
        let mut m = manager("b1", "Bob");
        let a1 = LinkId::from("a1");

        m.handle_negotiation_event(NegotiationEvent::IncomingLink {
            link_id: a1.clone(),
            metadata: Some(LinkMetadata { name: "Alice".into() }),
        })
        .unwrap();
        m.handle_negotiation_event(NegotiationEvent::RemoteStream {
            link_id: a1.clone(),
            stream: StreamId::from("s1"),
        })
        .unwrap();

        assert_eq!(m.surfaces().get(&a1).unwrap().label, "Alice");

        let mut anonymous = manager("c1", "Carol");
        anonymous.on_incoming_link(&a1, None).unwrap();
        anonymous.on_remote_stream(&a1, StreamId::from("s1"));
        assert_eq!(
            anonymous.surfaces().get(&a1).unwrap().label,
            FALLBACK_PEER_LABEL
        );
    }

    #[test]
    fn test_user_disconnected_closes_exactly_one_link() {
        let mut m = manager("a1", "Alice");
        let b1 = LinkId::from("b1");
        m.on_user_connected(&b1, "Bob").unwrap();
        m.on_remote_stream(&b1, StreamId::from("s1"));

        let closed = m.on_user_disconnected(&b1).unwrap();
        assert_eq!(closed.state, LinkState::Closed);
        assert!(m.on_user_disconnected(&b1).is_none());

        let closes = m
            .negotiator()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Close(_)))
            .count();
        assert_eq!(closes, 1);
        assert!(m.surfaces().get(&b1).is_none());
        assert_eq!(m.surfaces().layout(), GridLayout::Single);
    }

    #[test]
    fn test_link_closed_callback_removes_surface() {
        let mut m = manager("a1", "Alice");
        let b1 = LinkId::from("b1");
        m.on_user_connected(&b1, "Bob").unwrap();
        m.on_remote_stream(&b1, StreamId::from("s1"));

        m.handle_negotiation_event(NegotiationEvent::LinkClosed { link_id: b1.clone() })
            .unwrap();

        assert!(m.session().link(&b1).is_none());
        assert!(m.surfaces().get(&b1).is_none());
        // The library already closed it
        assert!(!m.negotiator().calls.contains(&Call::Close(b1)));
    }

    #[test]
    fn test_symmetric_links_after_negotiation() {
        let mut a = manager("a1", "Alice");
        let mut b = manager("b1", "Bob");
        let a1 = LinkId::from("a1");
        let b1 = LinkId::from("b1");

        // B joined: A initiates, B answers, streams flow both ways
        a.on_user_connected(&b1, "Bob").unwrap();
        b.on_incoming_link(&a1, Some(LinkMetadata { name: "Alice".into() }))
            .unwrap();
        a.on_remote_stream(&b1, StreamId::from("b1-local"));
        b.on_remote_stream(&a1, StreamId::from("a1-local"));

        for (m, remote) in [(&a, &b1), (&b, &a1)] {
            assert_eq!(m.session().link_count(), 1);
            assert_eq!(m.session().established_count(), 1);
            assert!(m.session().link(remote).unwrap().is_established());
        }
    }

    #[test]
    fn test_toggle_does_not_touch_links() {
        let mut m = manager("a1", "Alice");
        let b1 = LinkId::from("b1");
        m.on_user_connected(&b1, "Bob").unwrap();
        m.on_remote_stream(&b1, StreamId::from("s1"));
        let calls_before = m.negotiator().calls.len();

        assert_eq!(m.toggle_video(), Some(false));
        assert_eq!(m.toggle_audio(), Some(false));
        assert_eq!(m.toggle_video(), Some(true));

        assert_eq!(m.negotiator().calls.len(), calls_before);
        assert!(m.session().link(&b1).unwrap().is_established());
    }

    #[test]
    fn test_close_all() {
        let mut m = manager("a1", "Alice");
        m.on_user_connected(&LinkId::from("b1"), "Bob").unwrap();
        m.on_user_connected(&LinkId::from("c1"), "Carol").unwrap();

        assert_eq!(m.close_all(), 2);
        assert_eq!(m.session().link_count(), 0);
        assert_eq!(m.surfaces().layout(), GridLayout::Single);
    }
}
