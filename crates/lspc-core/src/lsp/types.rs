//! JSON-RPC 2.0 message types for LSP communication.

use lsp_types::CompletionItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// JSON-RPC protocol version carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

/// JSON-RPC 2.0 request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version, always "2.0".
    pub jsonrpc: String,
    /// Request identifier.
    pub id: i64,
    /// Method name.
    pub method: String,
    /// Optional method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request envelope.
    #[must_use]
    pub fn new(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response message.
///
/// `result` and `error` are kept opaque; callers decode them per method.
/// Some servers omit `jsonrpc` on responses, so it defaults to "2.0".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version.
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// Request identifier.
    pub id: RequestId,
    /// Result value (if successful).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object (if failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl JsonRpcResponse {
    /// Typed view of the error object, if it has the standard shape.
    #[must_use]
    pub fn error_object(&self) -> Option<JsonRpcError> {
        self.error
            .as_ref()
            .and_then(|e| serde_json::from_value(e.clone()).ok())
    }

    /// Whether the response carries a populated error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.as_ref().is_some_and(|e| !e.is_null())
    }
}

/// JSON-RPC 2.0 notification message (no response expected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version, always "2.0".
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Optional method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Build a notification envelope.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            method: method.into(),
            params,
        }
    }
}

/// Request sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRequest {
    /// JSON-RPC version.
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// Server-chosen identifier.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Optional method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Request ID can be a number or string per JSON-RPC 2.0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl RequestId {
    /// Whether this identifier is the numeric id `id`.
    #[must_use]
    pub fn matches(&self, id: i64) -> bool {
        matches!(self, Self::Number(n) if *n == id)
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

/// Inbound message from LSP server.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Response to a request.
    Response(JsonRpcResponse),
    /// Notification from server.
    Notification(JsonRpcNotification),
    /// Request from server.
    Request(ServerRequest),
    /// Envelope with neither a usable `id` nor a `method`.
    ///
    /// Servers answer unparseable input with `"id": null`; such replies
    /// cannot be routed to any request and are kept only for logging.
    Unaddressed(Value),
}

impl InboundMessage {
    /// Classify a decoded JSON value by the presence of `id` and `method`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`] if the value is not a JSON-RPC envelope.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Decoding(format!(
                "expected a JSON-RPC object, got: {value}"
            )));
        }

        let has_id = value.get("id").is_some_and(|id| !id.is_null());
        let has_method = value.get("method").is_some();

        match (has_id, has_method) {
            (true, true) => serde_json::from_value(value)
                .map(Self::Request)
                .map_err(|e| Error::Decoding(format!("invalid server request: {e}"))),
            (true, false) => serde_json::from_value(value)
                .map(Self::Response)
                .map_err(|e| Error::Decoding(format!("invalid response: {e}"))),
            (false, true) => serde_json::from_value(value)
                .map(Self::Notification)
                .map_err(|e| Error::Decoding(format!("invalid notification: {e}"))),
            (false, false) => Ok(Self::Unaddressed(value)),
        }
    }

    /// Method name of a notification or server request.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Response(_) | Self::Unaddressed(_) => None,
            Self::Notification(n) => Some(&n.method),
            Self::Request(r) => Some(&r.method),
        }
    }
}

/// Completion result normalized to a list.
///
/// Servers may answer `textDocument/completion` with either a
/// `CompletionList` object or a bare `CompletionItem[]`; both decode here.
/// `isIncomplete` is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionList {
    /// More items may be available if the client re-requests.
    #[serde(default)]
    pub is_incomplete: bool,
    /// Completion items in server order.
    pub items: Vec<CompletionItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompletionPayload {
    List(CompletionList),
    Items(Vec<CompletionItem>),
}

impl CompletionList {
    /// Decode a `textDocument/completion` result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`] if the value is neither a list nor an array
    /// of items.
    pub fn from_result(value: Value) -> Result<Self> {
        let payload: CompletionPayload = serde_json::from_value(value)
            .map_err(|e| Error::Decoding(format!("invalid completion result: {e}")))?;
        Ok(match payload {
            CompletionPayload::List(list) => list,
            CompletionPayload::Items(items) => Self {
                is_incomplete: false,
                items,
            },
        })
    }

    /// Labels of all items, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.label.as_str()).collect()
    }
}
