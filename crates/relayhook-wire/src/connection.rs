//! The relay connection.
//!
//! A [`ConnectionHandle`] owns both halves of the single relay connection.
//! [`ConnectionHandle::close`] consumes the handle, so the connection is
//! released exactly once.

use crate::frame::{FrameReader, FrameWriter, WireError};
use chrono::{DateTime, Utc};
use relayhook_types::message::Message;
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Connection lifecycle of the client loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection. Initial and terminal state.
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Connected and exchanging frames.
    Connected,
    /// Shutdown requested, connection being released.
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

/// The single active relay connection.
pub struct ConnectionHandle<R = OwnedReadHalf, W = OwnedWriteHalf> {
    /// Unique id for log correlation.
    id: uuid::Uuid,
    /// Relay address (or a label for in-process transports).
    relay_addr: String,
    /// When the connection was established.
    connected_at: DateTime<Utc>,
    /// Inbound frames.
    pub reader: FrameReader<R>,
    /// Outbound frames.
    pub writer: FrameWriter<W>,
}

/// Connect to the relay. Failure is reported, never retried.
pub async fn connect(addr: &str, max_frame_bytes: usize) -> Result<ConnectionHandle, WireError> {
    debug!(relay = %addr, "Connecting to relay");
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| WireError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    let relay_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| addr.to_string());
    let (reader, writer) = stream.into_split();
    Ok(ConnectionHandle::new(reader, writer, relay_addr, max_frame_bytes))
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> ConnectionHandle<R, W> {
    /// Build a handle over an already established transport.
    pub fn new(reader: R, writer: W, relay_addr: impl Into<String>, max_frame_bytes: usize) -> Self {
        let handle = Self {
            id: uuid::Uuid::new_v4(),
            relay_addr: relay_addr.into(),
            connected_at: Utc::now(),
            reader: FrameReader::new(reader, max_frame_bytes),
            writer: FrameWriter::new(writer),
        };
        info!(connection = %handle.id, relay = %handle.relay_addr, "Connected to relay");
        handle
    }

    /// Connection id.
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Relay address.
    pub fn relay_addr(&self) -> &str {
        &self.relay_addr
    }

    /// When the connection was established.
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Transmit one message.
    pub async fn send(&mut self, msg: &Message) -> Result<(), WireError> {
        self.writer.write_message(msg).await
    }

    /// Release the connection.
    pub async fn close(mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(connection = %self.id, error = %e, "Error shutting down relay connection");
        }
        let secs = (Utc::now() - self.connected_at).num_seconds();
        info!(connection = %self.id, relay = %self.relay_addr, connected_secs = secs, "Relay connection released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayhook_types::message::Content;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Closing.to_string(), "closing");
    }

    #[tokio::test]
    async fn test_connect_refused_is_connect_error() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        match connect(&addr, 1024).await {
            Err(WireError::Connect { addr: failed, .. }) => assert_eq!(failed, addr),
            Err(other) => panic!("Expected Connect error, got {other:?}"),
            Ok(_) => panic!("Expected Connect error, got a connection"),
        }
    }

    #[tokio::test]
    async fn test_connect_send_and_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(stream).lines();
            let first = lines.next_line().await.unwrap();
            let after_close = lines.next_line().await.unwrap();
            (first, after_close)
        });

        let mut handle = connect(&addr, 1024).await.unwrap();
        assert_eq!(handle.relay_addr(), addr);
        handle
            .send(&Message::new("", Content::Text("ping".to_string())))
            .await
            .unwrap();
        handle.close().await;

        let (first, after_close) = server.await.unwrap();
        assert!(first.unwrap().contains("\"content\":\"ping\""));
        assert!(after_close.is_none());
    }
}
