//! LSP transport layer for stdio communication.
//!
//! This module implements the LSP header-content message format over the
//! server's stdin/stdout. Messages follow the format:
//! ```text
//! Content-Length: 123\r\n
//! \r\n
//! {"jsonrpc":"2.0",...}
//! ```
//!
//! Reads go through a [`BufReader`], so a frame may arrive in any number of
//! short reads, and bytes belonging to the next frame stay buffered until the
//! next [`LspTransport::receive`] call.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::lsp::types::InboundMessage;

/// Largest frame body accepted by default (64 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Largest header block accepted, in bytes.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Transport over a spawned server's stdio pipes.
pub type StdioTransport = LspTransport<ChildStdin, ChildStdout>;

/// LSP transport layer handling header-content format.
///
/// This transport handles the LSP protocol's header-content message format,
/// parsing Content-Length headers and reading exact message content.
#[derive(Debug)]
pub struct LspTransport<W, R> {
    writer: W,
    reader: BufReader<R>,
    max_frame_bytes: usize,
}

impl<W, R> LspTransport<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Create transport from a write half and a read half.
    ///
    /// # Arguments
    ///
    /// * `writer` - The server's stdin handle for sending messages
    /// * `reader` - The server's stdout handle for receiving messages
    #[must_use]
    pub fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            reader: BufReader::new(reader),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Cap the size of inbound frame bodies.
    #[must_use]
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    /// Send message to LSP server.
    ///
    /// Formats the message with proper Content-Length header and writes the
    /// header and body before flushing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Message serialization fails ([`Error::Encoding`])
    /// - Writing to or flushing the stream fails ([`Error::Io`])
    pub async fn send<T: Serialize + ?Sized>(&mut self, message: &T) -> Result<()> {
        let content = serde_json::to_string(message).map_err(Error::Encoding)?;
        let header = format!("Content-Length: {}\r\n\r\n", content.len());

        trace!("Sending LSP message: {}", content);

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(content.as_bytes()).await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// Receive next message from LSP server.
    ///
    /// Reads headers, extracts Content-Length, reads exact message content,
    /// and classifies it as a response, notification or server request.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stream ends before a complete frame ([`Error::ServerTerminated`])
    /// - Content-Length header is missing, invalid or too large ([`Error::Framing`])
    /// - The body is not a JSON-RPC envelope ([`Error::Decoding`])
    /// - Reading from the stream fails ([`Error::Io`])
    pub async fn receive(&mut self) -> Result<InboundMessage> {
        let content_length = self.read_headers().await?;

        if content_length > self.max_frame_bytes {
            return Err(Error::Framing(format!(
                "Content-Length {content_length} exceeds maximum {}",
                self.max_frame_bytes
            )));
        }

        let content = self.read_content(content_length).await?;

        trace!("Received LSP message: {}", String::from_utf8_lossy(&content));

        let value: Value = serde_json::from_slice(&content)
            .map_err(|e| Error::Decoding(format!("invalid JSON body: {e}")))?;

        InboundMessage::from_value(value)
    }

    /// Release both streams.
    ///
    /// The read half is dropped first so it is released even when shutting
    /// down the write half fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if flushing or shutting down the write half fails.
    pub async fn close(self) -> Result<()> {
        let Self {
            mut writer, reader, ..
        } = self;
        drop(reader);

        let flushed = writer.flush().await;
        let shut = writer.shutdown().await;
        drop(writer);

        trace!("LSP transport closed");
        flushed?;
        shut?;
        Ok(())
    }

    /// Read headers until blank line, returning the Content-Length value.
    ///
    /// Headers are in the format "Key: Value\r\n" and are terminated by
    /// a blank line ("\r\n"). Unknown headers are ignored. The whole block
    /// is capped at [`MAX_HEADER_BYTES`].
    async fn read_headers(&mut self) -> Result<usize> {
        let mut content_length: Option<usize> = None;
        let mut line = Vec::new();
        let mut saw_header_bytes = false;
        let mut header_bytes = 0usize;

        loop {
            if header_bytes >= MAX_HEADER_BYTES {
                return Err(header_overflow());
            }

            line.clear();
            let budget = (MAX_HEADER_BYTES - header_bytes) as u64;
            let bytes_read = (&mut self.reader)
                .take(budget)
                .read_until(b'\n', &mut line)
                .await?;
            header_bytes += bytes_read;

            // EOF - stream closed (read_until returns 0 bytes on EOF)
            if bytes_read == 0 {
                trace!("EOF detected in read_headers: saw_header_bytes={saw_header_bytes}");
                if saw_header_bytes {
                    return Err(Error::Framing(
                        "unexpected EOF while reading headers".to_string(),
                    ));
                }
                return Err(Error::ServerTerminated);
            }
            saw_header_bytes = true;

            if !line.ends_with(b"\n") && header_bytes >= MAX_HEADER_BYTES {
                return Err(header_overflow());
            }

            let text = std::str::from_utf8(&line)
                .map_err(|e| Error::Framing(format!("non-UTF-8 header line: {e}")))?;
            let trimmed = text.trim();

            if trimmed.is_empty() {
                break;
            }

            if let Some((key, value)) = trimmed.split_once(':') {
                if key.trim().eq_ignore_ascii_case("content-length") {
                    let len = value.trim().parse::<usize>().map_err(|e| {
                        Error::Framing(format!("Invalid Content-Length {:?}: {e}", value.trim()))
                    })?;
                    content_length = Some(len);
                }
            } else {
                warn!("Malformed header: {}", trimmed);
            }
        }

        content_length.ok_or_else(|| Error::Framing("Missing Content-Length header".to_string()))
    }

    /// Read exact number of content bytes.
    async fn read_content(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; length];
        self.reader.read_exact(&mut buffer).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ServerTerminated
            } else {
                Error::Io(e)
            }
        })?;
        Ok(buffer)
    }
}

fn header_overflow() -> Error {
    Error::Framing(format!("header block exceeds {MAX_HEADER_BYTES} bytes"))
}
