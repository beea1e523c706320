//! Chat channel
//!
//! Own messages are echoed into the local view before they are sent, and
//! the relay never returns them to the sender, so each one shows exactly
//! once.

use super::view::ChatView;
use crate::protocol::{ChatMessage, ClientMessage, RoomId};

/// Chat for one room
#[derive(Debug)]
pub struct ChatChannel {
    room_id: RoomId,
    view: ChatView,
}

impl ChatChannel {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            view: ChatView::new(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    /// Echo `text` locally and build the message to relay
    ///
    /// Returns `None` for blank text.
    pub fn send(&mut self, text: &str, name: &str) -> Option<ClientMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.view.push_own(name, text);

        Some(ClientMessage::SendMessage {
            room_id: self.room_id.clone(),
            text: text.to_string(),
            name: name.to_string(),
        })
    }

    /// Append a message relayed from another participant
    pub fn on_receive(&mut self, message: &ChatMessage) {
        self.view.push_received(message);
    }

    /// Append "<name> joined the call"
    pub fn notice_joined(&mut self, name: &str) {
        let (sender, subject) = notice_names(name);
        self.view
            .push_system(sender, format!("{} joined the call", subject));
    }

    /// Append "<name> left the call"
    pub fn notice_left(&mut self, name: &str) {
        let (sender, subject) = notice_names(name);
        self.view
            .push_system(sender, format!("{} left the call", subject));
    }
}

fn notice_names(name: &str) -> (&str, &str) {
    let name = name.trim();
    if name.is_empty() {
        ("Someone", "A user")
    } else {
        (name, name)
    }
}
