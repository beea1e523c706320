//! Client configuration

use std::time::Duration;

use crate::protocol::constants::{DEFAULT_KEEPALIVE_SECS, DEFAULT_MAX_FRAME_SIZE, DEFAULT_PORT};
use crate::protocol::{display_name_or_pseudonym, pseudonym, RoomId};

/// Call participant configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Signaling server address (`host:port`)
    pub server_addr: String,

    /// Room to join
    pub room_id: RoomId,

    /// Name shown to other participants
    pub display_name: String,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Largest accepted frame body
    pub max_frame_size: usize,

    /// Enable TCP_NODELAY
    pub tcp_nodelay: bool,

    /// Interval between keep-alive lines (zero disables them)
    ///
    /// Must stay below the server's idle timeout, or a quiet participant is
    /// dropped from its room.
    pub keepalive_interval: Duration,
}

impl ClientConfig {
    /// Create a config for `room_id` on `server_addr` under a generated name
    pub fn new(server_addr: impl Into<String>, room_id: RoomId) -> Self {
        Self {
            server_addr: server_addr.into(),
            room_id,
            display_name: pseudonym(),
            connect_timeout: Duration::from_secs(10),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            tcp_nodelay: true,
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
        }
    }

    /// Config for a server on localhost at the default port
    pub fn localhost(room_id: RoomId) -> Self {
        Self::new(format!("127.0.0.1:{}", DEFAULT_PORT), room_id)
    }

    /// Set the display name; a blank name keeps a generated pseudonym
    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = display_name_or_pseudonym(name);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the keep-alive interval
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::PSEUDONYM_PREFIX;

    #[test]
    fn test_default_name_is_pseudonym() {
        let config = ClientConfig::localhost(RoomId::from("r1"));

        assert!(config.display_name.starts_with(PSEUDONYM_PREFIX));
        assert_eq!(config.server_addr, "127.0.0.1:3000");
        assert_eq!(config.keepalive_interval, Duration::from_secs(DEFAULT_KEEPALIVE_SECS));
    }

    #[test]
    fn test_display_name() {
        let config = ClientConfig::localhost(RoomId::from("r1")).display_name(" Alice ");
        assert_eq!(config.display_name, "Alice");

        let config = ClientConfig::localhost(RoomId::from("r1")).display_name("");
        assert!(config.display_name.starts_with(PSEUDONYM_PREFIX));
    }
}
