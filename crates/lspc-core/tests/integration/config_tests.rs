#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use lspc_core::config::WorkspaceConfig;
use lspc_core::lsp::InboundMessage;
use lspc_core::{ClientConfig, Error};
use serde_json::json;

use crate::common::mock_lsp::{MockLspServer, method_and_params, reply};
use crate::common::test_utils::config_fixture_path;

#[test]
fn test_minimal_fixture_uses_defaults() {
    let config = ClientConfig::load_from(&config_fixture_path("minimal.toml")).unwrap();

    assert_eq!(config.lsp_servers.len(), 1);
    assert_eq!(config.lsp_servers[0].command, "gopls");
    assert!(config.lsp_servers[0].args.is_empty());
    assert_eq!(config.session.request_timeout_seconds, 30);
    assert_eq!(config.language_for_path(Path::new("x.rs")), "rust");
}

#[test]
fn test_tuned_fixture() {
    let config = ClientConfig::load_from(&config_fixture_path("tuned.toml")).unwrap();

    assert_eq!(config.session.request_timeout_seconds, 5);
    assert_eq!(config.session.max_discarded_messages, 2);

    let gopls = config.server_for_language("go").unwrap();
    assert_eq!(gopls.args, vec!["serve"]);
    assert_eq!(gopls.timeout_seconds, Some(60));
    assert_eq!(gopls.env.get("GOFLAGS").map(String::as_str), Some("-mod=mod"));
    assert_eq!(
        gopls.initialization_options,
        Some(json!({"usePlaceholders": true, "staticcheck": false}))
    );

    assert_eq!(config.language_for_path(Path::new("page.gotmpl")), "gotmpl");
    assert_eq!(config.language_for_path(Path::new("x.rs")), "text");
    assert!(matches!(
        config.server_for_language("rust"),
        Err(Error::NoServerForLanguage(_))
    ));
}

#[test]
fn test_missing_config_file() {
    let err = ClientConfig::load_from(&config_fixture_path("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound(_)));
}

#[test]
fn test_unknown_key_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("lspc.toml");
    std::fs::write(&path, "[session]\nrequest_timeout = 5\n").unwrap();

    let err = ClientConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}

#[tokio::test]
async fn test_session_limits_flow_into_client() {
    let config = ClientConfig::load_from(&config_fixture_path("tuned.toml")).unwrap();

    let (mut client, server) = MockLspServer::spawn(config.session.clone(), |message| {
        match message {
            InboundMessage::Request(_) => (0..5)
                .map(|n| json!({"jsonrpc": "2.0", "method": "$/progress", "params": {"n": n}}))
                .collect(),
            _ => vec![],
        }
    });

    let err = client.request("custom/slow", ()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::CorrelationTimeout {
            id: 1,
            discarded: 3
        }
    ));

    client.close().await.unwrap();
    server.finish().await;
}

#[tokio::test]
async fn test_workspace_mapping_drives_language_id() {
    let config = ClientConfig::load_from(&config_fixture_path("tuned.toml")).unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("index.tmpl");
    std::fs::write(&path, "{{ .Title }}").unwrap();

    let (client, server) = MockLspServer::spawn(config.session.clone(), |message| {
        match message {
            InboundMessage::Request(r) => vec![reply(&r.id, json!(null))],
            _ => vec![],
        }
    });
    let mut client = client.with_workspace(config.workspace.clone());

    client.open_document(&path).await.unwrap();
    client.close().await.unwrap();

    let received = server.finish().await;
    let (_, params) = method_and_params(&received[0]);
    assert_eq!(params.unwrap()["textDocument"]["languageId"], "gotmpl");
}

#[test]
fn test_default_workspace_mapping() {
    let workspace = WorkspaceConfig::default();
    assert_eq!(workspace.get_language_for_path(Path::new("main.go")), Some("go"));
    assert_eq!(workspace.get_language_for_path(Path::new("README")), None);
}
