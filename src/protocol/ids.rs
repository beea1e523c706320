//! Identifier types
//!
//! Rooms, connections and links are addressed by small newtypes so they
//! cannot be mixed up at call sites.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::constants::{PSEUDONYM_LEN, PSEUDONYM_PREFIX};

/// Opaque, globally unique room identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random room identifier (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Transport connection identifier, assigned by the server per socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnId(u64);

impl ConnId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token the negotiation library uses to address a participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LinkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Generate a display name like `User_k3j9x0a2b`
pub fn pseudonym() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut rng = rand::thread_rng();
    let suffix: String = (0..PSEUDONYM_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("{}{}", PSEUDONYM_PREFIX, suffix)
}

/// Trim a user-supplied display name, falling back to a pseudonym when blank
pub fn display_name_or_pseudonym(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        pseudonym()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudonym_shape() {
        let name = pseudonym();
        assert!(name.starts_with(PSEUDONYM_PREFIX));
        let suffix = &name[PSEUDONYM_PREFIX.len()..];
        assert_eq!(suffix.len(), PSEUDONYM_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_blank_name_gets_pseudonym() {
        assert_eq!(display_name_or_pseudonym("  Alice "), "Alice");
        assert!(display_name_or_pseudonym("   ").starts_with(PSEUDONYM_PREFIX));
    }

    #[test]
    fn test_generated_room_ids_differ() {
        let a = RoomId::generate();
        let b = RoomId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&ConnId::new(7)).unwrap();
        assert_eq!(json, "7");
        let link: LinkId = serde_json::from_str("\"a1\"").unwrap();
        assert_eq!(link, LinkId::from("a1"));
    }
}
