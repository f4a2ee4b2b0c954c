//! LSP client session.
//!
//! One [`LspClient`] owns one transport and issues requests in strict
//! lock-step: each request is written, then inbound frames are read until the
//! response carrying the same id arrives. Anything else received in between
//! (server notifications, server requests, stale responses) is discarded.

use std::path::Path;

use lsp_types::{
    ClientCapabilities, ClientInfo, CodeLensWorkspaceClientCapabilities, CompletionContext,
    CompletionParams, CompletionTriggerKind, DidOpenTextDocumentParams, DocumentSymbolParams,
    InitializeParams, InitializeResult, InitializedParams, PartialResultParams, Position,
    SemanticTokensWorkspaceClientCapabilities, TextDocumentIdentifier, TextDocumentItem,
    TextDocumentPositionParams, Uri, WindowClientCapabilities, WorkDoneProgressParams,
    WorkspaceClientCapabilities, WorkspaceEditClientCapabilities, WorkspaceFolder,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, trace, warn};

use crate::config::{SessionConfig, WorkspaceConfig};
use crate::error::{Error, Result};
use crate::lsp::lifecycle::ServerState;
use crate::lsp::transport::LspTransport;
use crate::lsp::types::{
    CompletionList, InboundMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};
use crate::lsp::uri::path_to_uri;

/// Version sent in every `didOpen`; documents are never edited.
const DOCUMENT_VERSION: i32 = 1;

/// LSP client for communicating with a language server.
#[derive(Debug)]
pub struct LspClient<W, R> {
    transport: LspTransport<W, R>,
    next_id: i64,
    state: ServerState,
    session: SessionConfig,
    workspace: WorkspaceConfig,
    initialization_options: Option<Value>,
}

impl<W, R> LspClient<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Create a session over a transport.
    ///
    /// The transport's frame limit is replaced by `session.max_frame_bytes`.
    #[must_use]
    pub fn new(transport: LspTransport<W, R>, session: SessionConfig) -> Self {
        Self {
            transport: transport.with_max_frame_bytes(session.max_frame_bytes),
            next_id: 1,
            state: ServerState::Uninitialized,
            session,
            workspace: WorkspaceConfig::default(),
            initialization_options: None,
        }
    }

    /// Use a custom extension to language-id mapping for `didOpen`.
    #[must_use]
    pub fn with_workspace(mut self, workspace: WorkspaceConfig) -> Self {
        self.workspace = workspace;
        self
    }

    /// Send server-specific `initializationOptions` with `initialize`.
    #[must_use]
    pub fn with_initialization_options(mut self, options: Option<Value>) -> Self {
        self.initialization_options = options;
        self
    }

    /// Get the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Session limits in effect.
    #[must_use]
    pub const fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// Send a request and wait for the response with the matching id.
    ///
    /// `params` that serialize to `null` (such as `()`) are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `params` cannot be serialized ([`Error::Encoding`])
    /// - The transport fails while sending or receiving
    /// - More than `max_discarded_messages` unrelated messages arrive first
    ///   ([`Error::CorrelationTimeout`])
    /// - No response arrives within the request timeout ([`Error::Timeout`])
    pub async fn request<P: Serialize>(
        &mut self,
        method: &str,
        params: P,
    ) -> Result<JsonRpcResponse> {
        let params = encode_params(params)?;

        if self.state == ServerState::Uninitialized && method != "initialize" {
            warn!(method, "request sent before initialize");
        } else if self.state.is_stopping() && method != "shutdown" {
            warn!(method, state = ?self.state, "request sent after shutdown");
        }

        let id = self.next_id;
        self.next_id += 1;

        debug!(id, method, "sending request");
        self.transport
            .send(&JsonRpcRequest::new(id, method, params))
            .await?;

        let timeout = self.session.request_timeout();
        let timeout_secs = self.session.request_timeout_seconds;
        let response = tokio::time::timeout(timeout, self.await_response(id))
            .await
            .map_err(|_| Error::Timeout(timeout_secs))??;

        debug!(id, method, error = response.is_error(), "received response");
        Ok(response)
    }

    /// Send a request and decode its `result` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LspServerError`] if the server answered with an error,
    /// [`Error::Decoding`] if the result does not match `T`, and any error
    /// from [`Self::request`].
    pub async fn request_typed<P: Serialize, T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: P,
    ) -> Result<T> {
        let response = self.request(method, params).await?;
        if response.is_error() {
            return Err(server_error(&response));
        }
        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|e| Error::Decoding(format!("invalid {method} result: {e}")))
    }

    /// Send a notification. No response is awaited.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` cannot be serialized or the write fails.
    pub async fn notify<P: Serialize>(&mut self, method: &str, params: P) -> Result<()> {
        let params = encode_params(params)?;
        debug!(method, "sending notification");
        self.transport
            .send(&JsonRpcNotification::new(method, params))
            .await
    }

    /// Perform the `initialize` / `initialized` handshake.
    ///
    /// Client capabilities are declared statically. Must be the first request
    /// of the session; this is not enforced.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path cannot be turned into a URI, the
    /// server rejects `initialize`, its result cannot be decoded, or the
    /// transport fails.
    pub async fn initialize(&mut self, root_path: &Path) -> Result<InitializeResult> {
        let root_uri = path_to_uri(root_path)?;
        let name = root_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("workspace")
            .to_string();

        let params = InitializeParams {
            process_id: Some(std::process::id()),
            #[allow(deprecated)]
            root_path: Some(root_path.display().to_string()),
            #[allow(deprecated)]
            root_uri: Some(root_uri.clone()),
            initialization_options: self.initialization_options.clone(),
            capabilities: client_capabilities(),
            client_info: Some(ClientInfo {
                name: "lspc".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: root_uri,
                name,
            }]),
            ..Default::default()
        };

        self.state = ServerState::Initializing;
        info!(root = %root_path.display(), "initializing LSP server");

        let result: InitializeResult = match self.request_typed("initialize", params).await {
            Ok(result) => result,
            Err(e) => {
                self.state = ServerState::Uninitialized;
                return Err(e);
            }
        };

        self.notify("initialized", InitializedParams {}).await?;
        self.state = ServerState::Ready;

        if let Some(server) = &result.server_info {
            info!(
                server = %server.name,
                version = server.version.as_deref().unwrap_or("unknown"),
                "LSP server initialized"
            );
        }

        Ok(result)
    }

    /// Open a document with `textDocument/didOpen`.
    ///
    /// Sent as a notification; nothing is read back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileIo`] if the file cannot be read, or a URI or
    /// transport error.
    pub async fn open_document(&mut self, path: &Path) -> Result<Uri> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::FileIo {
                path: path.to_path_buf(),
                source,
            })?;
        let uri = path_to_uri(path)?;
        let language_id = self
            .workspace
            .get_language_for_path(path)
            .unwrap_or(self.session.default_language_id.as_str())
            .to_string();

        trace!(uri = uri.as_str(), %language_id, bytes = text.len(), "opening document");

        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id,
                version: DOCUMENT_VERSION,
                text,
            },
        };
        self.notify("textDocument/didOpen", params).await?;

        Ok(uri)
    }

    /// Request completions at a zero-based position.
    ///
    /// Returns `None` when the server answers with `null`, an error, or a
    /// result that is not a completion list.
    ///
    /// # Errors
    ///
    /// Returns an error only for URI, encoding, transport or correlation
    /// failures.
    pub async fn completion(
        &mut self,
        path: &Path,
        line: u32,
        character: u32,
    ) -> Result<Option<CompletionList>> {
        let params = CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier {
                    uri: path_to_uri(path)?,
                },
                position: Position { line, character },
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: Some(CompletionContext {
                trigger_kind: CompletionTriggerKind::INVOKED,
                trigger_character: None,
            }),
        };

        let response = self.request("textDocument/completion", params).await?;

        if response.is_error() {
            warn!(error = %server_error(&response), "completion request failed");
            return Ok(None);
        }
        let Some(result) = response.result else {
            debug!("completion returned no result");
            return Ok(None);
        };

        match CompletionList::from_result(result) {
            Ok(list) => Ok(Some(list)),
            Err(e) => {
                warn!(error = %e, "ignoring undecodable completion result");
                Ok(None)
            }
        }
    }

    /// Request `textDocument/documentSymbol` and return the raw response.
    ///
    /// Symbol shapes depend on the server, so decoding is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns a URI, transport or correlation error.
    pub async fn document_symbol(&mut self, path: &Path) -> Result<JsonRpcResponse> {
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier {
                uri: path_to_uri(path)?,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        self.request("textDocument/documentSymbol", params).await
    }

    /// Send `shutdown`.
    ///
    /// The caller still has to send `exit` and reap the process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownRejected`] if the server answered with an
    /// error, or a transport or correlation error.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.state = ServerState::ShuttingDown;
        let response = self.request("shutdown", ()).await?;
        if let Some(error) = response.error.filter(|e| !e.is_null()) {
            return Err(Error::ShutdownRejected(error));
        }
        debug!("shutdown acknowledged");
        Ok(())
    }

    /// Send the `exit` notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn exit(&mut self) -> Result<()> {
        self.notify("exit", ()).await?;
        self.state = ServerState::Shutdown;
        Ok(())
    }

    /// Close both streams of the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the write half fails to shut down.
    pub async fn close(self) -> Result<()> {
        self.transport.close().await
    }

    async fn await_response(&mut self, id: i64) -> Result<JsonRpcResponse> {
        let mut discarded = 0usize;
        loop {
            match self.transport.receive().await? {
                InboundMessage::Response(response) if response.id.matches(id) => {
                    return Ok(response);
                }
                other => {
                    discarded += 1;
                    match &other {
                        InboundMessage::Response(r) => {
                            debug!(expected = id, got = ?r.id, "discarding unmatched response");
                        }
                        InboundMessage::Unaddressed(value) => {
                            debug!(
                                expected = id,
                                error = ?value.get("error"),
                                "discarding response without id"
                            );
                        }
                        InboundMessage::Notification(_) | InboundMessage::Request(_) => {
                            trace!(
                                method = other.method().unwrap_or_default(),
                                "discarding server message"
                            );
                        }
                    }
                    if discarded > self.session.max_discarded_messages {
                        return Err(Error::CorrelationTimeout { id, discarded });
                    }
                }
            }
        }
    }
}

fn encode_params<P: Serialize>(params: P) -> Result<Option<Value>> {
    let value = serde_json::to_value(params).map_err(Error::Encoding)?;
    Ok(if value.is_null() { None } else { Some(value) })
}

fn server_error(response: &JsonRpcResponse) -> Error {
    match response.error_object() {
        Some(error) => Error::LspServerError {
            code: error.code,
            message: error.message,
        },
        None => Error::LspServerError {
            code: 0,
            message: response
                .error
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
        },
    }
}

fn client_capabilities() -> ClientCapabilities {
    ClientCapabilities {
        window: Some(WindowClientCapabilities::default()),
        workspace: Some(WorkspaceClientCapabilities {
            workspace_edit: Some(WorkspaceEditClientCapabilities {
                document_changes: Some(true),
                ..Default::default()
            }),
            workspace_folders: Some(true),
            code_lens: Some(CodeLensWorkspaceClientCapabilities {
                refresh_support: Some(true),
            }),
            semantic_tokens: Some(SemanticTokensWorkspaceClientCapabilities {
                refresh_support: Some(true),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
