//! End-to-end tests against real child processes.
//!
//! Small shell scripts stand in for a language server so the stdio pipes,
//! process exit detection and reaping are exercised without external tools.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use lspc_core::config::LspServerConfig;
use lspc_core::{ClientConfig, Error, LspServer};
use serde_json::json;

use crate::common::test_utils::init_test_tracing;
use crate::skip_if_missing;

/// A server that writes one canned frame, then drains stdin until it closes.
fn canned_server(body: &str) -> LspServerConfig {
    let script = format!(
        "printf 'Content-Length: {}\\r\\n\\r\\n%s' '{body}'; cat >/dev/null",
        body.len()
    );
    LspServerConfig::command("go", "sh").with_args(["-c", script.as_str()])
}

#[tokio::test]
async fn test_response_from_child_process() {
    let body = json!({"jsonrpc": "2.0", "id": 1, "result": {"answer": 42}}).to_string();
    let mut server = LspServer::spawn(&canned_server(&body), &ClientConfig::default()).unwrap();

    let response = server.client_mut().request("custom/ask", ()).await.unwrap();
    assert_eq!(response.result, Some(json!({"answer": 42})));

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_echoed_request_is_discarded() {
    skip_if_missing!("cat");
    init_test_tracing();

    let mut config = ClientConfig::default();
    config.session.max_discarded_messages = 0;

    let server_config = LspServerConfig::command("go", "cat");
    let mut server = LspServer::spawn(&server_config, &config).unwrap();

    let err = server
        .client_mut()
        .request("custom/echo", json!({"x": 1}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CorrelationTimeout {
            id: 1,
            discarded: 1
        }
    ));

    server.close().await.unwrap();
}

#[tokio::test]
async fn test_exit_status_is_reported() {
    let server_config = LspServerConfig::command("go", "sh").with_args(["-c", "exit 3"]);
    let mut server = LspServer::spawn(&server_config, &ClientConfig::default()).unwrap();

    let err = server.client_mut().request("custom/ping", ()).await.unwrap_err();
    match server.explain(err).await {
        Error::ServerExited { status } => assert_eq!(status.code(), Some(3)),
        other => panic!("expected exit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_environment_reaches_server() {
    let mut server_config = LspServerConfig::command("go", "sh").with_args([
        "-c",
        "body=\"{\\\"jsonrpc\\\":\\\"2.0\\\",\\\"id\\\":1,\\\"result\\\":\\\"$LSPC_MARKER\\\"}\"; \
         printf 'Content-Length: %d\\r\\n\\r\\n%s' \"${#body}\" \"$body\"; cat >/dev/null",
    ]);
    server_config
        .env
        .insert("LSPC_MARKER".to_string(), "marker-value".to_string());
    let mut server = LspServer::spawn(&server_config, &ClientConfig::default()).unwrap();

    let response = server.client_mut().request("custom/env", ()).await.unwrap();
    assert_eq!(response.result, Some(json!("marker-value")));

    server.close().await.unwrap();
}
