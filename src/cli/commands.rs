use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `chatrelay` - session-aware HTTP chat relay.
#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(version)]
#[command(
    about = "Relay chat turns to a language model, keeping per-session history.",
    long_about = None
)]
pub struct Cli {
    /// Config file (default: ~/.chatrelay/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of `log_level`
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        /// Port to listen on (use 0 for a random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

impl Default for Commands {
    fn default() -> Self {
        Self::Serve {
            port: None,
            host: None,
        }
    }
}
