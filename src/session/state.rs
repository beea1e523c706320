//! Per-participant session state
//!
//! Holds everything one participant knows locally: who it is, its captured
//! media, and the links it has with the rest of the room. Nothing here is
//! global, so several sessions can coexist in one process.

use std::collections::HashMap;
use std::time::Instant;

use super::link::{LinkState, PeerLink};
use super::media::MediaHandle;
use crate::protocol::LinkId;

/// Local state of one call participant
#[derive(Debug)]
pub struct ConnectionSession {
    /// Our own link identifier, announced in `join-room`
    own_link_id: LinkId,

    /// Local display name
    display_name: String,

    /// Captured media, or `None` if capture failed
    local_media: Option<MediaHandle>,

    /// Links keyed by the remote participant's link identifier
    links: HashMap<LinkId, PeerLink>,

    /// Session start time
    pub created_at: Instant,
}

impl ConnectionSession {
    /// Create a new session state
    pub fn new(own_link_id: LinkId, display_name: impl Into<String>) -> Self {
        Self {
            own_link_id,
            display_name: display_name.into(),
            local_media: None,
            links: HashMap::new(),
            created_at: Instant::now(),
        }
    }

    /// Attach captured media
    pub fn with_local_media(mut self, media: MediaHandle) -> Self {
        self.local_media = Some(media);
        self
    }

    pub fn own_link_id(&self) -> &LinkId {
        &self.own_link_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Local media handle, if capture succeeded
    pub fn local_media_handle(&self) -> Option<&MediaHandle> {
        self.local_media.as_ref()
    }

    /// Get a link by remote link identifier
    pub fn link(&self, remote: &LinkId) -> Option<&PeerLink> {
        self.links.get(remote)
    }

    pub fn links(&self) -> impl Iterator<Item = &PeerLink> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of links in the `Established` state
    pub fn established_count(&self) -> usize {
        self.links
            .values()
            .filter(|l| l.state == LinkState::Established)
            .count()
    }

    /// Mutable access to the link map, reserved for `PeerLinkManager`
    pub(super) fn links_mut(&mut self) -> &mut HashMap<LinkId, PeerLink> {
        &mut self.links
    }
}
