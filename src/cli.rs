//! Command-line interface definition for convlog
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for logging messages, recording commits, and
//! inspecting the stored conversations.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::conversation::{Content, Role, SessionId};

/// convlog - append-only conversation log
///
/// Records conversation messages as JSON files, keeps an index of sessions,
/// and tracks the latest session and commit in a memory file.
#[derive(Parser, Debug, Clone)]
#[command(name = "convlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: Option<String>,

    /// Storage root directory (overrides config and CONVLOG_ROOT)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for convlog
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Append a message to a session
    #[command(alias = "append")]
    Log {
        /// Session to append to; a new session id is generated when omitted
        #[arg(long = "session-id", alias = "sessionId")]
        session_id: Option<SessionId>,

        /// Message author: user, assistant, system or tool
        #[arg(long, default_value = "user")]
        role: Role,

        /// Message text
        #[arg(long)]
        content: Content,
    },

    /// Record a commit checkpoint in the memory file
    UpdateMemory {
        /// Commit hash of the checkpoint
        #[arg(long = "last-commit", alias = "lastCommit")]
        last_commit: Option<String>,

        /// Commit message of the checkpoint
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Inspect logged sessions
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Print the memory record
    Memory,
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List sessions from the index
    List,

    /// Print a session transcript
    Show {
        /// Session id
        id: SessionId,

        /// Print the raw session JSON instead of a transcript
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the index from session files
    Reindex,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some(crate::config::DEFAULT_CONFIG_FILE.to_string()),
            root: None,
            verbose: false,
            json_logs: false,
            command: Commands::Memory,
        }
    }
}
