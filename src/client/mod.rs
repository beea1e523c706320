//! Signaling client
//!
//! `SignalConnector` speaks the wire protocol to a `SignalServer`;
//! `CallParticipant` runs one participant's side of a call on top of it.

pub mod config;
pub mod connector;
pub mod participant;

pub use config::ClientConfig;
pub use connector::SignalConnector;
pub use participant::{CallCommand, CallParticipant};
