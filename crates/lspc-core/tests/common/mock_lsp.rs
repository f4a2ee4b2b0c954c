use lspc_core::lsp::{InboundMessage, LspTransport, RequestId};
use lspc_core::{LspClient, SessionConfig};
use serde_json::{Value, json};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

/// Client session wired to an in-memory peer.
pub type MockClient = LspClient<WriteHalf<DuplexStream>, ReadHalf<DuplexStream>>;

/// A scripted in-memory LSP server.
///
/// Every message the client sends is recorded and handed to a responder,
/// which returns the frames to write back (possibly none, possibly several).
/// The peer stops when the client closes its side.
pub struct MockLspServer {
    handle: JoinHandle<Vec<InboundMessage>>,
}

#[allow(dead_code)]
impl MockLspServer {
    /// Spawns the peer and returns a client connected to it.
    pub fn spawn<F>(session: SessionConfig, mut respond: F) -> (MockClient, Self)
    where
        F: FnMut(&InboundMessage) -> Vec<Value> + Send + 'static,
    {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_io);
        let (server_read, server_write) = tokio::io::split(server_io);

        let handle = tokio::spawn(async move {
            let mut peer = LspTransport::new(server_write, server_read);
            let mut received = Vec::new();
            while let Ok(message) = peer.receive().await {
                let replies = respond(&message);
                received.push(message);
                for reply in replies {
                    if peer.send(&reply).await.is_err() {
                        return received;
                    }
                }
            }
            received
        });

        let client = LspClient::new(LspTransport::new(client_write, client_read), session);
        (client, Self { handle })
    }

    /// Spawns a peer that answers every request with `result: null`.
    pub fn null_responder(session: SessionConfig) -> (MockClient, Self) {
        Self::spawn(session, |message| match message {
            InboundMessage::Request(r) => vec![reply(&r.id, Value::Null)],
            _ => vec![],
        })
    }

    /// Waits for the peer to stop and returns everything it received.
    pub async fn finish(self) -> Vec<InboundMessage> {
        self.handle.await.unwrap_or_default()
    }
}

/// Builds a success response for `id`.
pub fn reply(id: &RequestId, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

/// Builds an error response for `id`.
#[allow(dead_code)]
pub fn reply_error(id: &RequestId, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

/// Method and params of a recorded message, for assertions.
#[allow(dead_code)]
pub fn method_and_params(message: &InboundMessage) -> (Option<&str>, Option<&Value>) {
    match message {
        InboundMessage::Request(r) => (Some(r.method.as_str()), r.params.as_ref()),
        InboundMessage::Notification(n) => (Some(n.method.as_str()), n.params.as_ref()),
        InboundMessage::Response(_) | InboundMessage::Unaddressed(_) => (None, None),
    }
}
