//! Peer link state
//!
//! A `PeerLink` is the local record of one media negotiation with a remote
//! participant, keyed by that participant's link identifier.

use std::time::{Duration, Instant};

use super::media::StreamId;
use crate::protocol::LinkId;

/// Which side started the negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// We initiated after a `user-connected` notification
    Outbound,
    /// The remote initiated and we answered
    Inbound,
}

/// Link lifecycle state
///
/// There is no negotiation timeout: a remote that never answers leaves the
/// link in `Negotiating` until a leave notification or close callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Negotiating,
    Established,
    Closed,
}

/// One negotiated (or negotiating) link to a remote participant
#[derive(Debug, Clone)]
pub struct PeerLink {
    /// Remote participant's link identifier
    pub remote: LinkId,

    pub direction: LinkDirection,

    pub state: LinkState,

    /// Display name of the remote, if known
    pub remote_name: Option<String>,

    /// Remote media stream, once established
    pub remote_stream: Option<StreamId>,

    /// When negotiation started
    pub started_at: Instant,

    /// When the first remote stream arrived
    pub established_at: Option<Instant>,
}

impl PeerLink {
    /// Create a link in the `Negotiating` state
    pub fn new(remote: LinkId, direction: LinkDirection, remote_name: Option<String>) -> Self {
        Self {
            remote,
            direction,
            state: LinkState::Negotiating,
            remote_name,
            remote_stream: None,
            started_at: Instant::now(),
            established_at: None,
        }
    }

    /// Attach a remote stream
    ///
    /// Moves `Negotiating` to `Established`. On an established link the new
    /// stream replaces the old one. Returns false if the link is closed.
    pub fn establish(&mut self, stream: StreamId) -> bool {
        match self.state {
            LinkState::Negotiating => {
                self.state = LinkState::Established;
                self.established_at = Some(Instant::now());
                self.remote_stream = Some(stream);
                true
            }
            LinkState::Established => {
                self.remote_stream = Some(stream);
                true
            }
            LinkState::Closed => false,
        }
    }

    /// Mark the link closed and forget its stream
    pub fn close(&mut self) {
        self.state = LinkState::Closed;
        self.remote_stream = None;
    }

    pub fn is_established(&self) -> bool {
        self.state == LinkState::Established
    }

    /// Time spent negotiating, if established
    pub fn setup_time(&self) -> Option<Duration> {
        self.established_at
            .map(|at| at.duration_since(self.started_at))
    }
}
