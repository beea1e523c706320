//! Chat transcript

use crate::protocol::{unix_millis, ChatMessage, ConnId};

/// Who an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Local echo of our own message
    Own,
    /// Relayed from another participant
    Other,
    /// Join and leave notices
    System,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub kind: EntryKind,
    pub sender: String,
    /// Set for relayed messages only
    pub sender_conn_id: Option<ConnId>,
    pub text: String,
    /// Unix milliseconds
    pub timestamp: u64,
}

impl ChatEntry {
    /// Name to show next to the entry
    pub fn display_sender(&self) -> &str {
        match self.kind {
            EntryKind::Own => "You",
            EntryKind::Other | EntryKind::System => &self.sender,
        }
    }
}

/// Append-only list of chat entries
#[derive(Debug, Default)]
pub struct ChatView {
    entries: Vec<ChatEntry>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_own(&mut self, sender: &str, text: &str) {
        self.entries.push(ChatEntry {
            kind: EntryKind::Own,
            sender: sender.to_string(),
            sender_conn_id: None,
            text: text.to_string(),
            timestamp: unix_millis(),
        });
    }

    pub fn push_received(&mut self, message: &ChatMessage) {
        self.entries.push(ChatEntry {
            kind: EntryKind::Other,
            sender: message.name.clone(),
            sender_conn_id: Some(message.sender_conn_id),
            text: message.text.clone(),
            timestamp: message.timestamp,
        });
    }

    pub fn push_system(&mut self, sender: &str, text: impl Into<String>) {
        self.entries.push(ChatEntry {
            kind: EntryKind::System,
            sender: sender.to_string(),
            sender_conn_id: None,
            text: text.into(),
            timestamp: unix_millis(),
        });
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one kind, in arrival order
    pub fn of_kind(&self, kind: EntryKind) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}
