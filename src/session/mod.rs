//! Client-side call session
//!
//! `ConnectionSession` holds one participant's local identity, media and
//! links. `PeerLinkManager` owns the session and applies relay notifications
//! and negotiation callbacks to it, keeping the video surfaces in step.

pub mod link;
pub mod manager;
pub mod media;
pub mod negotiator;
pub mod state;
pub mod surface;

pub use link::{LinkDirection, LinkState, PeerLink};
pub use manager::PeerLinkManager;
pub use media::{MediaHandle, MediaTrack, StreamId, TrackKind};
pub use negotiator::{LinkMetadata, NegotiationEvent, Negotiator};
pub use state::ConnectionSession;
pub use surface::{GridLayout, SurfaceChange, SurfaceGrid, VideoSurface};
