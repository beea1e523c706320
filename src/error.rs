//! Error types
//!
//! `Error` is the crate-wide error. Each concern has its own sub-error that
//! converts into it, so `?` works across module boundaries.

use std::fmt;

use crate::protocol::LinkId;
use crate::registry::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Debug)]
pub enum Error {
    /// Socket or other I/O failure
    Io(std::io::Error),
    /// Frame could not be decoded or violated the protocol
    Protocol(ProtocolError),
    /// Room registry rejected the request
    Registry(RegistryError),
    /// Peer link could not be created or answered
    Link(LinkError),
    /// Connection was closed by the remote side
    ConnectionClosed,
    /// No frame arrived within the configured idle timeout
    Timeout,
}

/// Wire protocol errors
#[derive(Debug)]
pub enum ProtocolError {
    /// Frame body was not valid JSON for the expected message type
    Malformed(serde_json::Error),
    /// Frame exceeded the configured maximum size
    FrameTooLarge { size: usize, max: usize },
    /// Message is valid but not allowed in the current state
    UnexpectedMessage(String),
}

/// Peer link errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Outbound link requested without a local media handle
    NoLocalMedia,
    /// The negotiation library refused the request
    Negotiation { link_id: LinkId, reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Link(e) => write!(f, "Link error: {}", e),
            Error::ConnectionClosed => write!(f, "Connection closed"),
            Error::Timeout => write!(f, "Timed out waiting for data"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed(e) => write!(f, "Malformed frame: {}", e),
            ProtocolError::FrameTooLarge { size, max } => {
                write!(f, "Frame of {} bytes exceeds limit of {}", size, max)
            }
            ProtocolError::UnexpectedMessage(msg) => write!(f, "Unexpected message: {}", msg),
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::NoLocalMedia => write!(f, "No local media available"),
            LinkError::Negotiation { link_id, reason } => {
                write!(f, "Negotiation with {} failed: {}", link_id, reason)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(ProtocolError::Malformed(e)) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ProtocolError {}

impl std::error::Error for LinkError {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Protocol(ProtocolError::Malformed(err))
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::Registry(err)
    }
}

impl From<LinkError> for Error {
    fn from(err: LinkError) -> Self {
        Error::Link(err)
    }
}
