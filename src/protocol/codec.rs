//! Frame codec
//!
//! Messages travel as one JSON document per line. JSON encoders escape
//! newlines inside strings, so the delimiter never appears in a body.
//!
//! ```text
//! {"type":"join-room","room_id":"r1","link_id":"a1","name":"Alice"}\n
//! {"type":"send-message","room_id":"r1","text":"hi","name":"Alice"}\n
//! ```
//!
//! `FrameCodec` works on a `BytesMut` buffer and is I/O free.
//! `FrameReader`/`FrameWriter` drive it over any tokio stream half.

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, ProtocolError, Result};

use super::constants::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_READ_BUFFER_SIZE, FRAME_DELIMITER};

/// Newline-delimited JSON codec
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    /// Create a codec that rejects frame bodies larger than `max_frame_size`
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Decode the next complete frame from `buf`
    ///
    /// Returns `Ok(None)` when more data is needed. Consumed bytes are split
    /// off the buffer even when the body fails to parse, so the caller can
    /// keep reading after a malformed frame.
    pub fn decode<T: DeserializeOwned>(&self, buf: &mut BytesMut) -> Result<Option<T>> {
        loop {
            let Some(pos) = buf.iter().position(|b| *b == FRAME_DELIMITER) else {
                if buf.len() > self.max_frame_size {
                    return Err(ProtocolError::FrameTooLarge {
                        size: buf.len(),
                        max: self.max_frame_size,
                    }
                    .into());
                }
                return Ok(None);
            };

            if pos > self.max_frame_size {
                return Err(ProtocolError::FrameTooLarge {
                    size: pos,
                    max: self.max_frame_size,
                }
                .into());
            }

            let line = buf.split_to(pos + 1);
            let body = trim_ascii_whitespace(&line[..pos]);

            // Blank lines are keep-alives
            if body.is_empty() {
                continue;
            }

            return serde_json::from_slice(body).map(Some).map_err(Error::from);
        }
    }

    /// Append `msg` to `buf` as a single frame
    pub fn encode<T: Serialize>(&self, msg: &T, buf: &mut BytesMut) -> Result<()> {
        let body = serde_json::to_vec(msg)?;
        self.check_len(body.len())?;

        buf.reserve(body.len() + 1);
        buf.put_slice(&body);
        buf.put_u8(FRAME_DELIMITER);
        Ok(())
    }

    /// Check that `msg` would encode within the frame limit
    pub fn check_size<T: Serialize>(&self, msg: &T) -> Result<()> {
        self.check_len(serde_json::to_vec(msg)?.len())
    }

    fn check_len(&self, size: usize) -> Result<()> {
        if size > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

fn trim_ascii_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

/// Reads frames from an async byte stream
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
    codec: FrameCodec,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, codec: FrameCodec) -> Self {
        Self::with_capacity(inner, codec, DEFAULT_READ_BUFFER_SIZE)
    }

    pub fn with_capacity(inner: R, codec: FrameCodec, capacity: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(capacity),
            codec,
        }
    }

    /// Read the next frame
    ///
    /// Returns `Ok(None)` on a clean end of stream and
    /// `Error::ConnectionClosed` if the stream ends mid-frame. Cancel safe:
    /// bytes already read stay buffered for the next call.
    pub async fn read_frame<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.buf)? {
                return Ok(Some(frame));
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.buf.iter().all(|b| b.is_ascii_whitespace()) {
                    return Ok(None);
                }
                return Err(Error::ConnectionClosed);
            }
        }
    }
}

/// Writes frames to an async byte stream
pub struct FrameWriter<W> {
    inner: W,
    buf: BytesMut,
    codec: FrameCodec,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W, codec: FrameCodec) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            codec,
        }
    }

    /// Encode and flush a single frame
    pub async fn write_frame<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        self.buf.clear();
        self.codec.encode(msg, &mut self.buf)?;
        self.inner.write_all(&self.buf).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Write an empty line, which readers skip
    pub async fn write_keepalive(&mut self) -> Result<()> {
        self.inner.write_all(&[FRAME_DELIMITER]).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ClientMessage, LinkId, RoomId, ServerMessage};

    fn join(name: &str) -> ClientMessage {
        ClientMessage::JoinRoom {
            room_id: RoomId::from("r1"),
            link_id: LinkId::from("a1"),
            name: name.into(),
        }
    }

    #[test]
    fn test_decode_partial_then_complete() {
        let codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(&join("Alice"), &mut buf).unwrap();

        let mut partial = buf.split_to(10);
        assert!(codec.decode::<ClientMessage>(&mut partial).unwrap().is_none());

        partial.unsplit(buf);
        let msg: ClientMessage = codec.decode(&mut partial).unwrap().unwrap();
        assert_eq!(msg, join("Alice"));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"\n  \r\n{\"type\":\"leave-room\",\"room_id\":\"r1\"}\r\n"[..]);

        let msg: ClientMessage = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(
            msg,
            ClientMessage::LeaveRoom {
                room_id: RoomId::from("r1")
            }
        );
    }

    #[test]
    fn test_malformed_frame_is_consumed() {
        let codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"{oops}\n{\"type\":\"leave-room\",\"room_id\":\"r1\"}\n"[..]);

        let err = codec.decode::<ClientMessage>(&mut buf).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Malformed(_))));

        // The next frame is still readable
        let msg: Option<ClientMessage> = codec.decode(&mut buf).unwrap();
        assert!(msg.is_some());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let codec = FrameCodec::new(16);
        let mut buf = BytesMut::from(&[b'x'; 32][..]);

        let err = codec.decode::<ClientMessage>(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::FrameTooLarge { size: 32, max: 16 })
        ));

        let mut out = BytesMut::new();
        assert!(codec.encode(&join("a very long display name"), &mut out).is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_reader_across_chunks() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"type\":\"user-connected\",")
            .read(b"\"link_id\":\"b1\",\"name\":\"Bob\"}\n")
            .build();
        let mut reader = FrameReader::new(mock, FrameCodec::default());

        let msg: ServerMessage = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(
            msg,
            ServerMessage::UserConnected {
                link_id: LinkId::from("b1"),
                name: "Bob".into()
            }
        );
        assert!(reader.read_frame::<ServerMessage>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_eof_mid_frame() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"type\":\"user-con")
            .build();
        let mut reader = FrameReader::new(mock, FrameCodec::default());

        let err = reader.read_frame::<ServerMessage>().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[test]
    fn test_check_size() {
        let codec = FrameCodec::new(48);

        assert!(codec.check_size(&ServerMessage::error("short")).is_ok());
        let err = codec
            .check_size(&ServerMessage::error("x".repeat(48)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::FrameTooLarge { max: 48, .. })
        ));
    }

    #[tokio::test]
    async fn test_writer_keepalive_is_blank_line() {
        let mock = tokio_test::io::Builder::new().write(b"\n").build();
        let mut writer = FrameWriter::new(mock, FrameCodec::default());

        writer.write_keepalive().await.unwrap();
    }

    #[tokio::test]
    async fn test_writer_emits_delimited_json() {
        let mock = tokio_test::io::Builder::new()
            .write(b"{\"type\":\"error\",\"message\":\"room is full\"}\n")
            .build();
        let mut writer = FrameWriter::new(mock, FrameCodec::default());

        writer
            .write_frame(&ServerMessage::error("room is full"))
            .await
            .unwrap();
    }
}
