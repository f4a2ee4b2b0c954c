//! # lspc-core
//!
//! Core library for talking to a Language Server Protocol server over its
//! standard input/output.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`lsp`] - framing, request correlation and server process lifecycle
//! - [`config`] - Configuration types and loading
//! - [`error`] - Error types for the library
//!
//! A session is strictly lock-step: one request is in flight at a time and
//! every operation takes `&mut self`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use lspc_core::{ClientConfig, LspServer};
//!
//! # async fn run() -> Result<(), lspc_core::Error> {
//! let config = ClientConfig::load()?;
//! let server_config = config.server_for_language("go")?.clone();
//! let mut server = LspServer::spawn(&server_config, &config)?;
//!
//! let client = server.client_mut();
//! client.initialize(Path::new("/home/me/project")).await?;
//! client.open_document(Path::new("/home/me/project/main.go")).await?;
//! if let Some(list) = client
//!     .completion(Path::new("/home/me/project/main.go"), 5, 2)
//!     .await?
//! {
//!     for label in list.labels() {
//!         println!("{label}");
//!     }
//! }
//!
//! server.shutdown().await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lsp;

pub use config::{ClientConfig, LspServerConfig, SessionConfig};
pub use error::{Error, Result};
pub use lsp::{LspClient, LspServer, LspTransport};
