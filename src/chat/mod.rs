//! Room chat
//!
//! Text rides the signaling connection as `send-message` /
//! `receive-message`. The channel keeps the local transcript.

pub mod channel;
pub mod view;

pub use channel::ChatChannel;
pub use view::{ChatEntry, ChatView, EntryKind};
