//! Signaling server
//!
//! Accepts participant connections, assigns each a connection id, and runs
//! one `Connection` task per socket against a shared `SignalRelay`.

pub mod config;
pub mod connection;
pub mod handler;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use handler::{Admission, ConnectionContext, DefaultHandler, SignalHandler};
pub use listener::SignalServer;
