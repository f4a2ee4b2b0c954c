//! LSP client implementation.
//!
//! This module provides the LSP client for communicating with language servers
//! over JSON-RPC 2.0: framing ([`LspTransport`]), request correlation
//! ([`LspClient`]) and process management ([`LspServer`]).

mod client;
mod lifecycle;
mod transport;
pub mod types;
mod uri;

pub use client::LspClient;
pub use lifecycle::{LspServer, ServerState, StdioClient};
pub use transport::{DEFAULT_MAX_FRAME_BYTES, LspTransport, MAX_HEADER_BYTES, StdioTransport};
pub use types::{
    CompletionList, InboundMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId, ServerRequest,
};
pub use uri::path_to_uri;
