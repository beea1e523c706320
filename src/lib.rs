//! # meet-rs
//!
//! Room signaling relay and peer link lifecycle for multi-party video calls.
//!
//! Participants connect to a [`SignalServer`], join a room, and learn about
//! each other through `user-connected` / `user-disconnected` notifications.
//! Media itself flows peer to peer; the server only relays the control
//! messages and room chat.
//!
//! On the client side, a [`PeerLinkManager`] turns those notifications and
//! the callbacks of an external negotiation library into one link and one
//! video surface per remote participant.
//!
//! ```no_run
//! use meet_rs::{DefaultHandler, ServerConfig, SignalServer};
//!
//! # async fn example() -> meet_rs::Result<()> {
//! let server = SignalServer::new(ServerConfig::default(), DefaultHandler);
//! server.run().await
//! # }
//! ```

pub mod chat;
pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use chat::{ChatChannel, ChatView};
pub use client::{CallCommand, CallParticipant, ClientConfig, SignalConnector};
pub use error::{Error, LinkError, ProtocolError, Result};
pub use protocol::{ChatMessage, ClientMessage, ConnId, LinkId, RoomId, ServerMessage};
pub use registry::{RegistryConfig, RegistryError, RoomInvite, RoomRegistry};
pub use relay::SignalRelay;
pub use server::{DefaultHandler, ServerConfig, SignalHandler, SignalServer};
pub use session::{ConnectionSession, MediaHandle, NegotiationEvent, Negotiator, PeerLinkManager};
pub use stats::ServerStats;
