//! Error types for lspc-core.
//!
//! This module defines the canonical error type for the library. Framing,
//! decoding and I/O failures leave the session unusable; callers are expected
//! to close the transport and start over.

use std::path::PathBuf;
use std::process::ExitStatus;

/// The main error type for lspc-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Outbound message could not be serialized to JSON.
    #[error("failed to encode message: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Missing or malformed `Content-Length` framing on an inbound message.
    #[error("LSP framing error: {0}")]
    Framing(String),

    /// Frame body is not valid JSON or not a JSON-RPC envelope.
    #[error("failed to decode message: {0}")]
    Decoding(String),

    /// I/O error on the server's stdio streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File I/O error occurred.
    #[error("file I/O error for {path:?}: {source}")]
    FileIo {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Server answered `shutdown` with an error object.
    #[error("server rejected shutdown: {0}")]
    ShutdownRejected(serde_json::Value),

    /// LSP server returned an error response.
    #[error("LSP server error: {code} - {message}")]
    LspServerError {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the server.
        message: String,
    },

    /// Too many unrelated messages arrived while waiting for a response.
    #[error("no response for request {id} after discarding {discarded} messages")]
    CorrelationTimeout {
        /// Identifier of the request still waiting for its response.
        id: i64,
        /// Number of messages discarded while waiting.
        discarded: usize,
    },

    /// Request timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Server closed its output stream.
    #[error("LSP server process terminated unexpectedly")]
    ServerTerminated,

    /// Server process has exited.
    #[error("LSP server process exited: {status}")]
    ServerExited {
        /// Exit status reported by the operating system.
        status: ExitStatus,
    },

    /// LSP server failed to spawn.
    #[error("failed to spawn LSP server '{command}': {source}")]
    ServerSpawnFailed {
        /// Command that failed to spawn.
        command: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// LSP client transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid URI format.
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// No LSP server configured for the given language.
    #[error("no LSP server configured for language: {0}")]
    NoServerForLanguage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether the session can keep being used after this error.
    ///
    /// Encoding failures happen before any byte is written and a rejected
    /// shutdown is a complete response, so the stream stays in sync.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ShutdownRejected(_) | Self::Encoding(_))
    }
}

/// A specialized Result type for lspc-core operations.
pub type Result<T> = std::result::Result<T, Error>;
