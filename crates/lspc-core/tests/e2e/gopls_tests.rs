//! Tests against a real `gopls`.
//!
//! These tests are ignored by default. Run with `cargo test -- --ignored`
//! on a machine with `gopls` on `PATH`.

use anyhow::{Context, Result};
use lspc_core::config::LspServerConfig;
use lspc_core::{ClientConfig, LspServer};

use crate::common::test_utils::{go_main_path, go_workspace_path, init_test_tracing};

#[tokio::test]
#[ignore = "requires gopls"]
async fn test_gopls_completion_after_package_selector() -> Result<()> {
    if !crate::common::test_utils::command_available("gopls") {
        eprintln!("Skipping test: gopls not available");
        return Ok(());
    }
    init_test_tracing();

    let config = ClientConfig::default();
    let mut server = LspServer::spawn(&LspServerConfig::gopls(), &config)?;

    let client = server.client_mut();
    let init = client.initialize(&go_workspace_path()).await?;
    assert!(init.capabilities.completion_provider.is_some());

    client.open_document(&go_main_path()).await?;
    let list = client
        .completion(&go_main_path(), 5, 5)
        .await?
        .context("gopls returned no completions for `fmt.`")?;
    assert!(list.labels().contains(&"Println"));

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires gopls"]
async fn test_gopls_document_symbols() -> Result<()> {
    if !crate::common::test_utils::command_available("gopls") {
        eprintln!("Skipping test: gopls not available");
        return Ok(());
    }
    init_test_tracing();

    let config = ClientConfig::default();
    let mut server = LspServer::spawn(&LspServerConfig::gopls(), &config)?;

    let client = server.client_mut();
    client.initialize(&go_workspace_path()).await?;
    client.open_document(&go_main_path()).await?;
    let response = client.document_symbol(&go_main_path()).await?;
    assert!(!response.is_error());

    let symbols = response.result.context("documentSymbol returned no result")?;
    assert!(
        symbols
            .as_array()
            .is_some_and(|s| s.iter().any(|sym| sym["name"] == "main"))
    );

    server.shutdown().await?;
    Ok(())
}
