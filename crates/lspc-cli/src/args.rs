//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line Language Server Protocol client
///
/// Spawns a language server, opens one document and prints the answer to a
/// single query as JSON on stdout.
#[derive(Debug, Parser)]
#[command(name = "lspc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, searches for lspc.toml in:
    /// 1. $LSPC_CONFIG environment variable
    /// 2. Current directory
    /// 3. ~/.config/lspc/lspc.toml
    #[arg(short, long, global = true, value_name = "FILE", env = "LSPC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    ///
    /// Valid values: trace, debug, info, warn, error
    #[arg(short, long, global = true, default_value = "info", env = "LSPC_LOG")]
    pub log_level: String,

    /// Output logs as JSON (for structured logging)
    #[arg(long, global = true, default_value = "false", env = "LSPC_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Query to run against the server.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request completions at a position
    Completion {
        #[command(flatten)]
        target: Target,

        /// Zero-based line
        line: u32,

        /// Zero-based UTF-16 column
        column: u32,
    },

    /// List the symbols of a document
    Symbols {
        #[command(flatten)]
        target: Target,
    },
}

impl Command {
    /// Workspace and document the query applies to.
    pub const fn target(&self) -> &Target {
        match self {
            Self::Completion { target, .. } | Self::Symbols { target } => target,
        }
    }
}

/// Workspace, document and server selection shared by every query.
#[derive(Debug, clap::Args)]
pub struct Target {
    /// Workspace root sent as `rootUri`
    #[arg(long, value_name = "DIR")]
    pub root: PathBuf,

    /// Document to open
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Server command line, overriding the configured server
    ///
    /// Split on whitespace: the first word is the program, the rest are
    /// its arguments.
    #[arg(long, value_name = "CMD")]
    pub server: Option<String>,
}
