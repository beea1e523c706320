//! Call participant
//!
//! Ties one participant's signaling connection, link manager and chat
//! together. Server messages and negotiation callbacks are dispatched by
//! exhaustive matches, so every event kind has exactly one handler.

use tokio::sync::mpsc;

use crate::chat::ChatChannel;
use crate::error::Result;
use crate::protocol::{ClientMessage, LinkId, RoomId, ServerMessage};
use crate::session::{
    ConnectionSession, MediaHandle, NegotiationEvent, Negotiator, PeerLinkManager,
};

use super::config::ClientConfig;
use super::connector::SignalConnector;

/// Local user actions fed into `CallParticipant::run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallCommand {
    /// Send chat text to the room
    SendChat(String),
    ToggleVideo,
    ToggleAudio,
    /// Leave the room and stop
    Leave,
}

/// One participant in a call
pub struct CallParticipant<N: Negotiator> {
    room_id: RoomId,
    links: PeerLinkManager<N>,
    chat: ChatChannel,
    last_error: Option<String>,
}

impl<N: Negotiator> CallParticipant<N> {
    /// Create a participant
    ///
    /// `local_media` is `None` when capture failed; the participant can
    /// still receive.
    pub fn new(
        config: &ClientConfig,
        own_link_id: LinkId,
        local_media: Option<MediaHandle>,
        negotiator: N,
    ) -> Self {
        let mut session = ConnectionSession::new(own_link_id, config.display_name.clone());
        match local_media {
            Some(media) => session = session.with_local_media(media),
            None => tracing::warn!("No local media, joining receive-only"),
        }

        Self {
            room_id: config.room_id.clone(),
            links: PeerLinkManager::new(session, negotiator),
            chat: ChatChannel::new(config.room_id.clone()),
            last_error: None,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn links(&self) -> &PeerLinkManager<N> {
        &self.links
    }

    pub fn chat(&self) -> &ChatChannel {
        &self.chat
    }

    /// Last `error` message received from the server
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The `join-room` request for this participant
    pub fn join_message(&self) -> ClientMessage {
        let session = self.links.session();
        ClientMessage::JoinRoom {
            room_id: self.room_id.clone(),
            link_id: session.own_link_id().clone(),
            name: session.display_name().to_string(),
        }
    }

    pub fn leave_message(&self) -> ClientMessage {
        ClientMessage::LeaveRoom {
            room_id: self.room_id.clone(),
        }
    }

    /// Echo chat locally and build the message to send
    pub fn send_chat(&mut self, text: &str) -> Option<ClientMessage> {
        let name = self.links.session().display_name().to_string();
        self.chat.send(text, &name)
    }

    /// Apply one message from the signaling server
    pub fn handle_server_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::UserConnected { link_id, name } => {
                self.chat.notice_joined(&name);
                if let Err(e) = self.links.on_user_connected(&link_id, &name) {
                    tracing::warn!(link_id = %link_id, error = %e, "Cannot open link");
                }
            }
            ServerMessage::UserDisconnected { link_id, name } => {
                self.chat.notice_left(&name);
                self.links.on_user_disconnected(&link_id);
            }
            ServerMessage::ReceiveMessage(chat) => {
                self.chat.on_receive(&chat);
            }
            ServerMessage::Error { message } => {
                tracing::warn!(room = %self.room_id, error = %message, "Server rejected request");
                self.last_error = Some(message);
            }
        }
    }

    /// Apply one callback from the negotiation library
    pub fn handle_negotiation_event(&mut self, event: NegotiationEvent) {
        let link_id = event.link_id().clone();
        if let Err(e) = self.links.handle_negotiation_event(event) {
            tracing::warn!(link_id = %link_id, error = %e, "Negotiation callback failed");
        }
    }

    /// Apply a local command. Returns the message to send, if any.
    fn handle_command(&mut self, command: CallCommand) -> Option<ClientMessage> {
        match command {
            CallCommand::SendChat(text) => self.send_chat(&text),
            CallCommand::ToggleVideo => {
                let enabled = self.links.toggle_video();
                tracing::debug!(enabled = ?enabled, "Video toggled");
                None
            }
            CallCommand::ToggleAudio => {
                let enabled = self.links.toggle_audio();
                tracing::debug!(enabled = ?enabled, "Audio toggled");
                None
            }
            CallCommand::Leave => Some(self.leave_message()),
        }
    }

    /// Join the room and process events until leaving or losing the server
    ///
    /// Ends on `CallCommand::Leave`, when the command channel closes, or when
    /// the server connection ends. Every link is closed on the way out.
    pub async fn run(
        &mut self,
        connector: &mut SignalConnector,
        negotiation: &mut mpsc::UnboundedReceiver<NegotiationEvent>,
        commands: &mut mpsc::Receiver<CallCommand>,
    ) -> Result<()> {
        connector.send(self.join_message())?;
        tracing::info!(room = %self.room_id, "Joined call");

        let result = loop {
            tokio::select! {
                frame = connector.recv() => match frame {
                    Ok(Some(message)) => self.handle_server_message(message),
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                },
                Some(event) = negotiation.recv() => self.handle_negotiation_event(event),
                command = commands.recv() => {
                    let command = command.unwrap_or(CallCommand::Leave);
                    let leaving = command == CallCommand::Leave;
                    if let Some(message) = self.handle_command(command) {
                        if let Err(e) = connector.send(message) {
                            break Err(e);
                        }
                    }
                    if leaving {
                        break Ok(());
                    }
                }
            }
        };

        let closed = self.links.close_all();
        tracing::info!(room = %self.room_id, links_closed = closed, "Left call");
        result
    }
}
