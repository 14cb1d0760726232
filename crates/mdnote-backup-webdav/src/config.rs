use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line configuration for mdnote-backup.
#[derive(Parser, Debug, Clone)]
#[command(name = "mdnote-backup")]
#[command(about = "Back up Markdown notes to WebDAV and restore them into a local cache")]
pub struct Config {
    /// WebDAV config file (JSON)
    #[arg(long, env = "MDNOTE_CONFIG", global = true)]
    pub config_path: Option<PathBuf>,

    /// Directory for restored documents
    #[arg(long, env = "MDNOTE_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Request timeout (seconds)
    #[arg(long, default_value = "30", env = "MDNOTE_TIMEOUT_SECS", global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Save the WebDAV endpoint and credentials
    Configure {
        /// WebDAV server URL
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "")]
        username: String,

        #[arg(long, default_value = "", env = "MDNOTE_WEBDAV_PASSWORD", hide_env_values = true)]
        password: String,

        /// Directory below the server URL that holds the backups
        #[arg(long, default_value = "")]
        remote_dir: String,
    },
    /// Print the saved config (password masked)
    ShowConfig,
    /// List Markdown backups on the server
    List,
    /// Upload a timestamped copy of a local file
    Backup {
        /// File to back up
        file: PathBuf,
    },
    /// Download a backup into the cache directory
    Restore {
        /// Name as printed by `list`
        name: String,
    },
}
