//! Configuration types and loading.
//!
//! This module provides configuration structures for lspc,
//! including session limits, LSP server definitions and the
//! file-extension to language-id mapping used for `didOpen`.

mod server;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
pub use server::LspServerConfig;

use crate::error::{Error, Result};
use crate::lsp::DEFAULT_MAX_FRAME_BYTES;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "LSPC_CONFIG";

/// Configuration file name searched in the current and user config directories.
pub const CONFIG_FILE_NAME: &str = "lspc.toml";

/// Maps file extensions to LSP language identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageExtensionMapping {
    /// Array of extensions and their corresponding language ID.
    pub extensions: Vec<String>,
    /// Language ID to report to the LSP server.
    pub language_id: String,
}

impl LanguageExtensionMapping {
    fn new(extensions: &[&str], language_id: &str) -> Self {
        Self {
            extensions: extensions.iter().map(|e| (*e).to_string()).collect(),
            language_id: language_id.to_string(),
        }
    }
}

/// Main configuration for lspc.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Session limits.
    #[serde(default)]
    pub session: SessionConfig,

    /// Workspace configuration.
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// LSP server configurations.
    #[serde(default)]
    pub lsp_servers: Vec<LspServerConfig>,
}

/// Limits applied to a single client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// How long to wait for the response to one request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// How many unrelated messages may be skipped while waiting for a response.
    #[serde(default = "default_max_discarded")]
    pub max_discarded_messages: usize,

    /// Largest inbound frame body accepted, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Language ID used for files whose extension is not mapped.
    #[serde(default = "default_language_id")]
    pub default_language_id: String,
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_discarded() -> usize {
    1000
}

const fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

fn default_language_id() -> String {
    "plaintext".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            max_discarded_messages: default_max_discarded(),
            max_frame_bytes: default_max_frame_bytes(),
            default_language_id: default_language_id(),
        }
    }
}

impl SessionConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Workspace-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// File extension to language ID mappings.
    #[serde(default = "default_language_extensions")]
    pub language_extensions: Vec<LanguageExtensionMapping>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            language_extensions: default_language_extensions(),
        }
    }
}

impl WorkspaceConfig {
    /// Get the language ID for a file extension.
    #[must_use]
    pub fn get_language_for_extension(&self, extension: &str) -> Option<&str> {
        self.language_extensions
            .iter()
            .find(|mapping| mapping.extensions.iter().any(|e| e == extension))
            .map(|mapping| mapping.language_id.as_str())
    }

    /// Get the language ID for a file path, based on its extension.
    #[must_use]
    pub fn get_language_for_path(&self, path: &Path) -> Option<&str> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.get_language_for_extension(e))
    }
}

fn default_language_extensions() -> Vec<LanguageExtensionMapping> {
    vec![
        LanguageExtensionMapping::new(&["go"], "go"),
        LanguageExtensionMapping::new(&["rs"], "rust"),
        LanguageExtensionMapping::new(&["py", "pyi"], "python"),
        LanguageExtensionMapping::new(&["ts", "mts", "cts"], "typescript"),
        LanguageExtensionMapping::new(&["tsx"], "typescriptreact"),
        LanguageExtensionMapping::new(&["js", "mjs", "cjs"], "javascript"),
        LanguageExtensionMapping::new(&["c", "h"], "c"),
        LanguageExtensionMapping::new(&["cpp", "cc", "cxx", "hpp", "hh"], "cpp"),
        LanguageExtensionMapping::new(&["java"], "java"),
        LanguageExtensionMapping::new(&["json"], "json"),
        LanguageExtensionMapping::new(&["toml"], "toml"),
        LanguageExtensionMapping::new(&["md", "markdown"], "markdown"),
    ]
}

impl ClientConfig {
    /// Load configuration from the default path.
    ///
    /// Default paths checked in order:
    /// 1. `$LSPC_CONFIG` environment variable
    /// 2. `./lspc.toml` (current directory)
    /// 3. `~/.config/lspc/lspc.toml` (platform config directory)
    ///
    /// Falls back to built-in defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `$LSPC_CONFIG` is set to an empty value,
    /// or an error if an existing config file fails to parse or validate.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if path.trim().is_empty() {
                return Err(Error::Config(format!("{CONFIG_ENV_VAR} is set but empty")));
            }
            return Self::load_from(Path::new(&path));
        }

        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load_from(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lspc").join(CONFIG_FILE_NAME);
            if user_config.exists() {
                return Self::load_from(&user_config);
            }
        }

        tracing::debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or parsing fails.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find the server configured for a language.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoServerForLanguage`] if none matches.
    pub fn server_for_language(&self, language_id: &str) -> Result<&LspServerConfig> {
        self.lsp_servers
            .iter()
            .find(|server| server.language_id == language_id)
            .ok_or_else(|| Error::NoServerForLanguage(language_id.to_string()))
    }

    /// Language ID for a path, falling back to the session default.
    #[must_use]
    pub fn language_for_path(&self, path: &Path) -> &str {
        self.workspace
            .get_language_for_path(path)
            .unwrap_or(self.session.default_language_id.as_str())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.session.request_timeout_seconds == 0 {
            return Err(Error::InvalidConfig(
                "request_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.session.max_frame_bytes == 0 {
            return Err(Error::InvalidConfig(
                "max_frame_bytes must be greater than zero".to_string(),
            ));
        }
        for server in &self.lsp_servers {
            if server.language_id.is_empty() {
                return Err(Error::InvalidConfig(
                    "language_id cannot be empty".to_string(),
                ));
            }
            if server.command.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "command cannot be empty for language '{}'",
                    server.language_id
                )));
            }
            if server.timeout_seconds == Some(0) {
                return Err(Error::InvalidConfig(format!(
                    "timeout_seconds must be greater than zero for language '{}'",
                    server.language_id
                )));
            }
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            workspace: WorkspaceConfig::default(),
            lsp_servers: vec![
                LspServerConfig::gopls(),
                LspServerConfig::rust_analyzer(),
                LspServerConfig::pyright(),
                LspServerConfig::typescript(),
                LspServerConfig::clangd(),
            ],
        }
    }
}
