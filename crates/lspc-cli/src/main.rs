//! lspc - command-line Language Server Protocol client
//!
//! Drives one server session per invocation: spawn, initialize, open the
//! document, run the query, print the result as JSON, shut down.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use lspc_core::{ClientConfig, LspServer, LspServerConfig};
use serde_json::Value;

mod args;
mod logging;

use args::{Args, Command, Target};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(&args.log_level, args.log_json)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting lspc");

    let config = if let Some(config_path) = &args.config {
        ClientConfig::load_from(config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        ClientConfig::load().context("failed to load configuration")?
    };

    tracing::debug!(
        lsp_servers = config.lsp_servers.len(),
        "configuration loaded"
    );

    let target = args.command.target();
    let server_config = resolve_server(&config, target)?;
    let mut server = LspServer::spawn(&server_config, &config)
        .with_context(|| format!("failed to start {}", server_config.command))?;
    tracing::debug!(
        command = server.command(),
        timeout_seconds = server.client().session().request_timeout_seconds,
        "LSP server started"
    );

    let output = match run(&mut server, &args.command).await {
        Ok(output) => output,
        Err(e) => {
            let e = server.explain(e).await;
            let command = server.command().to_string();
            if let Err(close_err) = server.close().await {
                tracing::debug!(error = %close_err, "cleanup after failure");
            }
            return Err(e).with_context(|| format!("LSP session with {command} failed"));
        }
    };

    let rendered = serde_json::to_string_pretty(&output).context("failed to render result")?;
    println!("{rendered}");

    // The result is already out; a failed teardown only affects the process.
    if let Err(e) = server.shutdown().await {
        if e.is_recoverable() {
            tracing::warn!(error = %e, "LSP server shutdown was not clean");
        } else {
            return Err(e).context("LSP server shutdown failed");
        }
    }

    tracing::info!("lspc finished");
    Ok(())
}

/// Pick the server for the target document.
///
/// `--server` replaces the program and arguments of the configured server
/// for the document's language, keeping its environment and initialization
/// options when one exists.
fn resolve_server(config: &ClientConfig, target: &Target) -> Result<LspServerConfig> {
    let language_id = config.language_for_path(&target.file);

    let Some(command_line) = &target.server else {
        return config
            .server_for_language(language_id)
            .cloned()
            .with_context(|| format!("cannot query {}", target.file.display()));
    };

    let mut words = command_line.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| anyhow!("--server must name a program"))?;

    let base = config
        .server_for_language(language_id)
        .cloned()
        .unwrap_or_else(|_| LspServerConfig::command(language_id, program));

    Ok(LspServerConfig {
        command: program.to_string(),
        args: words.map(str::to_string).collect(),
        ..base
    })
}

/// Run the query and return the value to print.
async fn run(server: &mut LspServer, command: &Command) -> lspc_core::Result<Value> {
    let target = command.target();
    let client = server.client_mut();

    let init = client.initialize(&target.root).await?;
    if let Some(info) = &init.server_info {
        tracing::info!(
            name = %info.name,
            version = info.version.as_deref().unwrap_or("unknown"),
            "server initialized"
        );
    }

    client.open_document(&target.file).await?;

    server.check_alive()?;
    let client = server.client_mut();

    match command {
        Command::Completion { line, column, .. } => {
            let list = client.completion(&target.file, *line, *column).await?;
            serde_json::to_value(list).map_err(lspc_core::Error::Encoding)
        }
        Command::Symbols { .. } => {
            let response = client.document_symbol(&target.file).await?;
            if response.is_error() {
                let (code, message) = response.error_object().map_or_else(
                    || (0, response.error.as_ref().map(Value::to_string).unwrap_or_default()),
                    |e| (e.code, e.message),
                );
                return Err(lspc_core::Error::LspServerError { code, message });
            }
            Ok(response.result.unwrap_or(Value::Null))
        }
    }
}
