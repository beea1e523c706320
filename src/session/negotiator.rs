//! Media negotiation seam
//!
//! The offer/answer/ICE exchange belongs to an external peer-connection
//! library. `Negotiator` is the narrow set of calls the link manager makes
//! into it, and `NegotiationEvent` the callbacks it reports back.

use serde::{Deserialize, Serialize};

use super::media::{MediaHandle, StreamId};
use crate::error::LinkError;
use crate::protocol::LinkId;

/// Metadata sent along with an outbound link request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    /// Display name of the initiating participant
    pub name: String,
}

/// Calls into the external negotiation library
pub trait Negotiator: Send {
    /// Start a link to `remote`, offering `local_media`
    fn initiate_link(
        &mut self,
        remote: &LinkId,
        local_media: &MediaHandle,
        metadata: LinkMetadata,
    ) -> Result<(), LinkError>;

    /// Answer a link request from `remote`
    ///
    /// `None` answers receive-only.
    fn answer_link(
        &mut self,
        remote: &LinkId,
        local_media: Option<&MediaHandle>,
    ) -> Result<(), LinkError>;

    /// Tear down the link to `remote`. Closing an unknown link is a no-op.
    fn close_link(&mut self, remote: &LinkId);
}

/// Callbacks from the external negotiation library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationEvent {
    /// A remote asked to open a link to us
    IncomingLink {
        link_id: LinkId,
        metadata: Option<LinkMetadata>,
    },
    /// Media arrived on a link
    RemoteStream { link_id: LinkId, stream: StreamId },
    /// The library closed a link
    LinkClosed { link_id: LinkId },
}

impl NegotiationEvent {
    /// Remote link identifier this event is about
    pub fn link_id(&self) -> &LinkId {
        match self {
            NegotiationEvent::IncomingLink { link_id, .. }
            | NegotiationEvent::RemoteStream { link_id, .. }
            | NegotiationEvent::LinkClosed { link_id } => link_id,
        }
    }
}
