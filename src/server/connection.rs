//! Per-connection signaling session
//!
//! Each accepted socket gets one `Connection`. It owns a reader loop that
//! decodes client frames and dispatches them, and a writer task that drains
//! the connection's outbox. Handlers are fixed by the `ClientMessage` enum,
//! so nothing is registered per event and nothing can be bound twice.
//!
//! Whatever ends the connection (EOF, I/O error, idle timeout, protocol
//! error) the cleanup path runs and is treated as a leave.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{
    ChatMessage, ClientMessage, ConnId, FrameCodec, FrameReader, FrameWriter, LinkId, RoomId,
    ServerMessage,
};
use crate::registry::{JoinOutcome, Outbox, Participant};
use crate::relay::SignalRelay;

use super::config::ServerConfig;
use super::handler::{Admission, ConnectionContext, SignalHandler};

/// Server side of one participant connection
pub struct Connection<H: SignalHandler> {
    ctx: ConnectionContext,
    config: ServerConfig,
    handler: Arc<H>,
    relay: Arc<SignalRelay>,
    outbox: Outbox,
    outbox_rx: Option<mpsc::UnboundedReceiver<ServerMessage>>,
    /// Current room membership, at most one
    joined: Option<(RoomId, Participant)>,
}

impl<H: SignalHandler> Connection<H> {
    pub fn new(
        conn_id: ConnId,
        peer_addr: SocketAddr,
        config: ServerConfig,
        handler: Arc<H>,
        relay: Arc<SignalRelay>,
    ) -> Self {
        let (outbox, outbox_rx) = mpsc::unbounded_channel();

        Self {
            ctx: ConnectionContext::new(conn_id, peer_addr),
            config,
            handler,
            relay,
            outbox,
            outbox_rx: Some(outbox_rx),
            joined: None,
        }
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.ctx
    }

    /// Serve the connection until it closes
    pub async fn run(&mut self, socket: TcpStream) -> Result<()> {
        let Some(outbox_rx) = self.outbox_rx.take() else {
            return Err(Error::ConnectionClosed);
        };

        let codec = self.codec();
        let (read_half, write_half) = socket.into_split();
        let mut writer_gone =
            spawn_writer(self.ctx.conn_id, FrameWriter::new(write_half, codec), outbox_rx);

        let mut reader =
            FrameReader::with_capacity(read_half, codec, self.config.read_buffer_size);
        let result = self.read_loop(&mut reader, &mut writer_gone).await;

        self.cleanup().await;
        result
    }

    /// Read and dispatch frames until the peer hangs up, goes idle, or the
    /// writer can no longer reach it
    async fn read_loop<R>(
        &mut self,
        reader: &mut FrameReader<R>,
        writer_gone: &mut oneshot::Receiver<()>,
    ) -> Result<()>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let idle_timeout = self.config.idle_timeout;

        loop {
            let frame = tokio::select! {
                frame = tokio::time::timeout(idle_timeout, reader.read_frame::<ClientMessage>()) => {
                    frame.map_err(|_| Error::Timeout)?
                }
                _ = &mut *writer_gone => {
                    tracing::debug!(conn_id = %self.ctx.conn_id, "Writer stopped, closing");
                    return Err(Error::ConnectionClosed);
                }
            };

            match frame {
                Ok(Some(message)) => self.dispatch(message).await,
                Ok(None) => return Ok(()),
                Err(Error::Protocol(ProtocolError::Malformed(e))) => {
                    tracing::warn!(
                        conn_id = %self.ctx.conn_id,
                        error = %e,
                        "Malformed frame ignored"
                    );
                    self.reply(ServerMessage::error(format!("malformed message: {}", e)));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Route one client message to its handler
    pub async fn dispatch(&mut self, message: ClientMessage) {
        tracing::trace!(
            conn_id = %self.ctx.conn_id,
            kind = message.kind(),
            "Frame received"
        );

        match message {
            ClientMessage::JoinRoom {
                room_id,
                link_id,
                name,
            } => self.on_join_room(room_id, link_id, &name).await,
            ClientMessage::SendMessage {
                room_id,
                text,
                name,
            } => self.on_send_message(room_id, &text, &name).await,
            ClientMessage::LeaveRoom { room_id } => self.on_leave_room(&room_id).await,
        }
    }

    async fn on_join_room(&mut self, room_id: RoomId, link_id: LinkId, name: &str) {
        match self.current_room() {
            Some(current) if current == room_id => {
                tracing::debug!(
                    conn_id = %self.ctx.conn_id,
                    room = %room_id,
                    "Already in room, join ignored"
                );
                return;
            }
            // A connection is in at most one room
            Some(_) => self.leave_current_room().await,
            None => {}
        }

        if let Admission::Reject(reason) = self.handler.on_join(&self.ctx, &room_id, name).await {
            tracing::info!(
                conn_id = %self.ctx.conn_id,
                room = %room_id,
                reason = %reason,
                "Join rejected by handler"
            );
            self.reply(ServerMessage::error(reason));
            return;
        }

        let participant = Participant::new(self.ctx.conn_id, link_id, name);

        match self
            .relay
            .join(&room_id, participant.clone(), self.outbox.clone())
            .await
        {
            Ok(JoinOutcome::Joined) => {
                self.ctx.room_id = Some(room_id.clone());
                self.ctx.link_id = Some(participant.link_id.clone());
                self.joined = Some((room_id, participant));
            }
            Ok(JoinOutcome::AlreadyMember) => {}
            Err(e) => {
                tracing::warn!(
                    conn_id = %self.ctx.conn_id,
                    room = %room_id,
                    error = %e,
                    "Join refused"
                );
                self.reply(ServerMessage::error(e.to_string()));
            }
        }
    }

    async fn on_send_message(&mut self, room_id: RoomId, text: &str, name: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let name = match (name.trim(), &self.joined) {
            ("", Some((_, participant))) => participant.name.clone(),
            (name, _) => name.to_string(),
        };
        let message = ChatMessage::new(self.ctx.conn_id, name, text);

        // The relayed frame is larger than the request, so check it here
        // rather than letting every recipient's writer refuse it
        let relayed = ServerMessage::ReceiveMessage(message.clone());
        if let Err(e) = self.codec().check_size(&relayed) {
            tracing::warn!(
                conn_id = %self.ctx.conn_id,
                room = %room_id,
                error = %e,
                "Chat refused"
            );
            self.reply(ServerMessage::error("message too long"));
            return;
        }

        match self
            .relay
            .relay_chat(&room_id, self.ctx.conn_id, message.clone())
            .await
        {
            Ok(_) => self.handler.on_chat(&self.ctx, &message).await,
            Err(e) => {
                tracing::warn!(
                    conn_id = %self.ctx.conn_id,
                    room = %room_id,
                    error = %e,
                    "Chat refused"
                );
                self.reply(ServerMessage::error(e.to_string()));
            }
        }
    }

    async fn on_leave_room(&mut self, room_id: &RoomId) {
        match self.current_room() {
            Some(current) if current == *room_id => self.leave_current_room().await,
            _ => tracing::debug!(
                conn_id = %self.ctx.conn_id,
                room = %room_id,
                "Leave for a room the connection is not in"
            ),
        }
    }

    fn current_room(&self) -> Option<RoomId> {
        self.joined.as_ref().map(|(room_id, _)| room_id.clone())
    }

    async fn leave_current_room(&mut self) {
        if let Some((room_id, _)) = self.joined.take() {
            self.relay.leave(&room_id, self.ctx.conn_id).await;
            self.ctx.room_id = None;
            self.ctx.link_id = None;
        }
    }

    /// Implicit leave on disconnect
    async fn cleanup(&mut self) {
        self.leave_current_room().await;
        self.handler.on_disconnect(&self.ctx).await;
    }

    fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.config.max_frame_size)
    }

    fn reply(&self, msg: ServerMessage) {
        // Writer gone means the socket is closing; nothing left to tell
        let _ = self.outbox.send(msg);
    }
}

/// Run the outbox writer on its own task
///
/// The returned receiver completes when the writer stops, so the reader can
/// end the connection instead of leaving an unreachable member behind.
fn spawn_writer<W>(
    conn_id: ConnId,
    mut writer: FrameWriter<W>,
    mut outbox_rx: mpsc::UnboundedReceiver<ServerMessage>,
) -> oneshot::Receiver<()>
where
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let (stopped_tx, stopped_rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Err(e) = drain_outbox(conn_id, &mut writer, &mut outbox_rx).await {
            tracing::debug!(conn_id = %conn_id, error = %e, "Write failed");
        }
        let _ = stopped_tx.send(());
    });

    stopped_rx
}

/// Write outbox messages until every sender is dropped
///
/// A message that cannot be encoded is skipped. Only an I/O failure ends
/// the loop with an error.
async fn drain_outbox<W>(
    conn_id: ConnId,
    writer: &mut FrameWriter<W>,
    outbox_rx: &mut mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(msg) = outbox_rx.recv().await {
        match writer.write_frame(&msg).await {
            Ok(()) => tracing::trace!(conn_id = %conn_id, kind = msg.kind(), "Frame sent"),
            Err(Error::Protocol(e)) => tracing::warn!(
                conn_id = %conn_id,
                kind = msg.kind(),
                error = %e,
                "Frame skipped"
            ),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
