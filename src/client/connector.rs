//! Signaling connection
//!
//! Outgoing messages go through a channel to a writer task, so `send` never
//! waits on the socket. Incoming messages are read on demand with `recv`,
//! which is cancel safe and can sit in a `select!`. The writer task also
//! sends a blank keep-alive line whenever the connection has been quiet for
//! `keepalive_interval`, so the server's idle timeout only fires for peers
//! that are really gone.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::{Error, Result};
use crate::protocol::{ClientMessage, FrameCodec, FrameReader, FrameWriter, ServerMessage};

use super::config::ClientConfig;

/// Client end of a signaling connection
pub struct SignalConnector {
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    reader: FrameReader<OwnedReadHalf>,
    local_addr: SocketAddr,
}

impl SignalConnector {
    /// Connect to the signaling server in `config`
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let socket = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect(config.server_addr.as_str()),
        )
        .await
        .map_err(|_| Error::Timeout)??;

        if config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        let local_addr = socket.local_addr()?;

        tracing::debug!(
            server = %config.server_addr,
            local = %local_addr,
            "Connected to signaling server"
        );

        let codec = FrameCodec::new(config.max_frame_size);
        let (read_half, write_half) = socket.into_split();
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(
            FrameWriter::new(write_half, codec),
            outgoing_rx,
            config.keepalive_interval,
        ));

        Ok(Self {
            outgoing,
            reader: FrameReader::new(read_half, codec),
            local_addr,
        })
    }

    /// Queue a message for the server
    pub fn send(&self, message: ClientMessage) -> Result<()> {
        self.outgoing
            .send(message)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Next message from the server, or `None` once the server hung up
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>> {
        self.reader.read_frame().await
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

async fn write_loop<W>(
    mut writer: FrameWriter<W>,
    mut outgoing: mpsc::UnboundedReceiver<ClientMessage>,
    keepalive: Duration,
) where
    W: AsyncWrite + Unpin,
{
    let mut ticker = (!keepalive.is_zero()).then(|| {
        let mut ticker = time::interval_at(Instant::now() + keepalive, keepalive);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        let result = tokio::select! {
            message = outgoing.recv() => {
                let Some(message) = message else { break };
                if let Some(ticker) = ticker.as_mut() {
                    ticker.reset();
                }
                writer.write_frame(&message).await
            }
            _ = next_tick(ticker.as_mut()) => {
                tracing::trace!("Keep-alive");
                writer.write_keepalive().await
            }
        };

        match result {
            Ok(()) => {}
            Err(Error::Protocol(e)) => {
                tracing::warn!(error = %e, "Message not sent");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Signaling write failed");
                break;
            }
        }
    }
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{LinkId, RoomId};

    fn leave() -> ClientMessage {
        ClientMessage::LeaveRoom {
            room_id: RoomId::from("r1"),
        }
    }

    #[tokio::test]
    async fn test_quiet_writer_sends_keepalive() {
        use tokio::io::AsyncReadExt;

        let (client, mut server) = tokio::io::duplex(64);
        let (tx, rx) = mpsc::unbounded_channel();

        let writer = FrameWriter::new(client, FrameCodec::default());
        let task = tokio::spawn(write_loop(writer, rx, Duration::from_millis(20)));

        let mut byte = [0u8; 1];
        tokio::time::timeout(Duration::from_secs(1), server.read_exact(&mut byte))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(byte[0], b'\n');

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_oversized_message_is_skipped() {
        let expected = serde_json::to_vec(&leave()).unwrap();
        let mut frame = expected.clone();
        frame.push(b'\n');
        let mock = tokio_test::io::Builder::new().write(&frame).build();
        let (tx, rx) = mpsc::unbounded_channel();

        let oversized = ClientMessage::JoinRoom {
            room_id: RoomId::from("r1"),
            link_id: LinkId::from("a1"),
            name: "x".repeat(expected.len()),
        };
        tx.send(oversized).unwrap();
        tx.send(leave()).unwrap();
        drop(tx);

        let writer = FrameWriter::new(mock, FrameCodec::new(expected.len()));
        write_loop(writer, rx, Duration::ZERO).await;
    }
}
