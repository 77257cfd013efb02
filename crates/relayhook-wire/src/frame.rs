//! Envelope framing.
//!
//! Every frame is one JSON [`Envelope`] terminated by `\n`. Compact JSON never
//! contains a raw newline, so a line is always exactly one frame.

use relayhook_types::message::{Content, Envelope, Message, PROTOCOL_VERSION, TYPE_TEXT};
use std::borrow::Cow;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

/// Errors from the wire protocol layer.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to connect to relay at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// Encode a message as one frame (envelope JSON + newline).
pub fn encode_frame(msg: &Message) -> Result<Vec<u8>, WireError> {
    let mut bytes = serde_json::to_vec(&Envelope::from_message(msg))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode one received line into a message. Never fails.
///
/// Lines that are not an envelope, or envelopes without `content`, are kept
/// as raw text so nothing the relay forwards is silently lost.
pub fn decode_frame(line: &str) -> Message {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let envelope = match serde_json::from_str::<Envelope>(line) {
        Ok(env) => env,
        Err(_) => return raw_text_message(line, None),
    };

    let Some(value) = envelope.content else {
        warn!(
            remote_addr = envelope.remote_addr.as_deref().unwrap_or("-"),
            "Inbound envelope has no content field, treating frame as text"
        );
        return raw_text_message(line, envelope.remote_addr);
    };

    let content = Content::from_wire_value(value, envelope.type_tag.as_deref());
    Message {
        type_tag: envelope
            .type_tag
            .unwrap_or_else(|| content.type_tag().to_string()),
        content,
        version: envelope
            .version
            .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
        remote_addr: envelope.remote_addr,
        route: envelope.route.unwrap_or_default(),
    }
}

fn raw_text_message(line: &str, remote_addr: Option<String>) -> Message {
    Message {
        content: Content::Text(line.to_string()),
        type_tag: TYPE_TEXT.to_string(),
        version: PROTOCOL_VERSION.to_string(),
        remote_addr,
        route: String::new(),
    }
}

/// One line pulled off the wire, before decoding.
enum RawLine {
    Line(Vec<u8>),
    Oversized(usize),
}

/// Reads frames from the relay.
///
/// At most `max_frame_bytes` of a line are ever buffered. The rest of an
/// oversized line is discarded as it arrives.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
    overflow: usize,
    max_frame_bytes: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a read half.
    pub fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            pending: Vec::new(),
            overflow: 0,
            max_frame_bytes,
        }
    }

    /// Read the next frame. `Ok(None)` means the relay closed the connection.
    ///
    /// Cancel safe: partial lines are kept in the reader between calls. Blank
    /// lines are skipped. Bytes that are not UTF-8 are replaced, never
    /// rejected. An oversized frame is discarded and reported as
    /// [`WireError::FrameTooLarge`]; the reader stays usable afterwards.
    pub async fn next_message(&mut self) -> Result<Option<Message>, WireError> {
        loop {
            let bytes = match self.next_raw_line().await? {
                None => return Ok(None),
                Some(RawLine::Oversized(size)) => {
                    return Err(WireError::FrameTooLarge {
                        size,
                        max: self.max_frame_bytes,
                    });
                }
                Some(RawLine::Line(bytes)) => bytes,
            };
            let line = String::from_utf8_lossy(&bytes);
            if let Cow::Owned(_) = line {
                warn!(len = bytes.len(), "Inbound frame is not valid UTF-8, replacing invalid bytes");
            }
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(decode_frame(&line)));
        }
    }

    /// Next `\n`-terminated line, without the terminator. A trailing line
    /// without terminator is returned at end of stream.
    async fn next_raw_line(&mut self) -> io::Result<Option<RawLine>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.overflow > 0 {
                    return Ok(Some(self.take_oversized()));
                }
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(RawLine::Line(std::mem::take(&mut self.pending))));
            }

            let newline = available.iter().position(|b| *b == b'\n');
            let chunk = &available[..newline.unwrap_or(available.len())];
            if self.overflow > 0 {
                self.overflow += chunk.len();
            } else if self.pending.len() + chunk.len() > self.max_frame_bytes {
                self.overflow = self.pending.len() + chunk.len();
                self.pending = Vec::new();
            } else {
                self.pending.extend_from_slice(chunk);
            }
            let consumed = newline.map_or(available.len(), |i| i + 1);
            self.reader.consume(consumed);

            if newline.is_some() {
                if self.overflow > 0 {
                    return Ok(Some(self.take_oversized()));
                }
                return Ok(Some(RawLine::Line(std::mem::take(&mut self.pending))));
            }
        }
    }

    fn take_oversized(&mut self) -> RawLine {
        let size = self.overflow;
        self.overflow = 0;
        RawLine::Oversized(size)
    }
}

/// Writes frames to the relay.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap a write half.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one framed message and flush.
    pub async fn write_message(&mut self, msg: &Message) -> Result<(), WireError> {
        let bytes = encode_frame(msg)?;
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the write direction.
    pub async fn shutdown(&mut self) -> Result<(), WireError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
