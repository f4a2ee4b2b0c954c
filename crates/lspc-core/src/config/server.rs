//! LSP server configuration types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for a single LSP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LspServerConfig {
    /// Language identifier (e.g., "go", "rust", "python").
    pub language_id: String,

    /// Command to start the LSP server.
    pub command: String,

    /// Arguments to pass to the LSP server command.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables for the LSP server process.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// LSP initialization options (server-specific).
    #[serde(default)]
    pub initialization_options: Option<serde_json::Value>,

    /// Request timeout in seconds, overriding the session default.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl LspServerConfig {
    /// Configuration for an arbitrary command with no arguments.
    #[must_use]
    pub fn command(language_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            language_id: language_id.into(),
            command: command.into(),
            args: vec![],
            env: HashMap::new(),
            initialization_options: None,
            timeout_seconds: None,
        }
    }

    /// Append command-line arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Create a default configuration for gopls.
    #[must_use]
    pub fn gopls() -> Self {
        Self::command("go", "gopls")
    }

    /// Create a default configuration for rust-analyzer.
    #[must_use]
    pub fn rust_analyzer() -> Self {
        Self::command("rust", "rust-analyzer")
    }

    /// Create a default configuration for pyright.
    #[must_use]
    pub fn pyright() -> Self {
        Self::command("python", "pyright-langserver").with_args(["--stdio"])
    }

    /// Create a default configuration for TypeScript language server.
    #[must_use]
    pub fn typescript() -> Self {
        Self::command("typescript", "typescript-language-server").with_args(["--stdio"])
    }

    /// Create a default configuration for clangd.
    #[must_use]
    pub fn clangd() -> Self {
        Self::command("cpp", "clangd")
    }
}
