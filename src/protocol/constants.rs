//! Signaling protocol constants

/// Default TCP port for the signaling server
pub const DEFAULT_PORT: u16 = 3000;

/// Frame delimiter: every JSON message ends with a newline
pub const FRAME_DELIMITER: u8 = b'\n';

/// Default maximum size of a single frame body (64KB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Default server idle timeout in seconds
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;

/// Default client keep-alive interval in seconds, well under the idle timeout
pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;

/// Default read buffer size (8KB)
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Label used when a remote participant did not share a display name
pub const FALLBACK_PEER_LABEL: &str = "Participant";

/// Prefix of generated display names
pub const PSEUDONYM_PREFIX: &str = "User_";

/// Number of random base-36 characters in a generated display name
pub const PSEUDONYM_LEN: usize = 9;
