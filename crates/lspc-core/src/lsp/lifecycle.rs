//! LSP server lifecycle management.
//!
//! This module handles the lifecycle of an LSP server process:
//! 1. Spawn server process with piped stdio
//! 2. Hand the pipes to a client session
//! 3. Liveness probing while the session runs
//! 4. Shutdown → exit → close, then reap (or kill) the process

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, LspServerConfig};
use crate::error::{Error, Result};
use crate::lsp::client::LspClient;
use crate::lsp::transport::{LspTransport, StdioTransport};

/// How long a server gets to exit on its own after `exit` or stream close.
const EXIT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// How long to wait for a process that just broke its pipes to be reaped.
const PIPE_EXIT_GRACE_PERIOD: Duration = Duration::from_millis(200);

/// State of an LSP server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Server has not been initialized.
    Uninitialized,
    /// `initialize` has been sent and not yet answered.
    Initializing,
    /// Server is ready to handle requests.
    Ready,
    /// `shutdown` has been sent.
    ShuttingDown,
    /// `exit` has been sent.
    Shutdown,
}

impl ServerState {
    /// Check if the server is ready to handle requests.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if the server has been asked to stop.
    #[must_use]
    pub const fn is_stopping(&self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Shutdown)
    }
}

/// Client session bound to a spawned server's stdio.
pub type StdioClient = LspClient<ChildStdin, ChildStdout>;

/// Managed LSP server process and the session talking to it.
pub struct LspServer {
    client: StdioClient,
    command: String,
    /// Child process handle. Killed on drop (`kill_on_drop`).
    child: Child,
}

impl std::fmt::Debug for LspServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LspServer")
            .field("client", &self.client)
            .field("command", &self.command)
            .field("pid", &self.child.id())
            .finish()
    }
}

impl LspServer {
    /// Spawn an LSP server and wrap its stdio in a client session.
    ///
    /// The server is not initialized; call
    /// [`LspClient::initialize`] through [`Self::client_mut`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Server process fails to spawn
    /// - stdin or stdout cannot be captured
    pub fn spawn(server: &LspServerConfig, config: &ClientConfig) -> Result<Self> {
        info!("Spawning LSP server: {} {:?}", server.command, server.args);

        let mut child = Command::new(&server.command)
            .args(&server.args)
            .envs(&server.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ServerSpawnFailed {
                command: server.command.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Transport("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Transport("Failed to capture stdout".to_string()))?;

        let mut session = config.session.clone();
        if let Some(timeout) = server.timeout_seconds {
            session.request_timeout_seconds = timeout;
        }

        let transport: StdioTransport = LspTransport::new(stdin, stdout);
        let client = LspClient::new(transport, session)
            .with_workspace(config.workspace.clone())
            .with_initialization_options(server.initialization_options.clone());

        debug!(pid = child.id(), "LSP server spawned");

        Ok(Self {
            client,
            command: server.command.clone(),
            child,
        })
    }

    /// Get client for making requests.
    #[must_use]
    pub const fn client(&self) -> &StdioClient {
        &self.client
    }

    /// Get mutable client for making requests.
    pub fn client_mut(&mut self) -> &mut StdioClient {
        &mut self.client
    }

    /// Command the server was started with.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit status if the process has already exited.
    ///
    /// # Errors
    ///
    /// Returns an error if the process status cannot be queried.
    pub fn exit_status(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Fail with [`Error::ServerExited`] if the process is gone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerExited`] once the process has exited.
    pub fn check_alive(&mut self) -> Result<()> {
        match self.exit_status()? {
            Some(status) => Err(Error::ServerExited { status }),
            None => Ok(()),
        }
    }

    /// Attribute a stream failure to process exit when that is the cause.
    ///
    /// A closed stdout or a broken stdin pipe usually means the server died.
    /// If the process exits within a short grace window the error becomes
    /// [`Error::ServerExited`]; any other error is returned unchanged.
    pub async fn explain(&mut self, error: Error) -> Error {
        let pipe_failure = match &error {
            Error::ServerTerminated => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        };
        if !pipe_failure {
            return error;
        }

        match tokio::time::timeout(PIPE_EXIT_GRACE_PERIOD, self.child.wait()).await {
            Ok(Ok(status)) => {
                warn!(command = %self.command, %status, "LSP server exited");
                Error::ServerExited { status }
            }
            _ => error,
        }
    }

    /// Shutdown server gracefully.
    ///
    /// Sends `shutdown`, then `exit`, closes the streams and waits for the
    /// process, killing it if it does not exit within the grace period.
    /// The process is reaped even when the handshake fails; the first
    /// handshake error is returned afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownRejected`] if the server refused `shutdown`,
    /// or the first transport or process error encountered.
    pub async fn shutdown(mut self) -> Result<()> {
        debug!("Shutting down LSP server");

        let handshake = match self.client.shutdown().await {
            Ok(()) => self.client.exit().await,
            Err(e) => Err(e),
        };

        let Self {
            client, mut child, ..
        } = self;
        let closed = client.close().await;
        let reaped = reap(&mut child).await;

        handshake?;
        closed?;
        let status = reaped?;

        info!(%status, "LSP server shut down");
        Ok(())
    }

    /// Close the streams and stop the process without the LSP handshake.
    ///
    /// # Errors
    ///
    /// Returns the first error from closing the streams or reaping the
    /// process.
    pub async fn close(self) -> Result<()> {
        let Self {
            client, mut child, ..
        } = self;
        let closed = client.close().await;
        let reaped = reap(&mut child).await;

        closed?;
        reaped?;
        Ok(())
    }
}

/// Wait for the process to exit, killing it after the grace period.
async fn reap(child: &mut Child) -> Result<ExitStatus> {
    if let Ok(status) = tokio::time::timeout(EXIT_GRACE_PERIOD, child.wait()).await {
        return Ok(status?);
    }

    warn!("LSP server did not exit in time, killing it");
    child.kill().await?;
    Ok(child.wait().await?)
}
