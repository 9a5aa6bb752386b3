use bivac_client::config::DEFAULT_BASE_URL;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "bivac",
    version,
    about = "Command-line client for the bivac backup manager",
    long_about = None
)]
pub struct Args {
    /// Address of the remote bivac manager
    #[arg(long, env = "BIVAC_REMOTE_ADDRESS", default_value = DEFAULT_BASE_URL, global = true)]
    pub remote_address: String,

    /// Pre-shared key sent as bearer token
    #[arg(long, env = "BIVAC_SERVER_PSK", hide_env_values = true, global = true)]
    pub psk: Option<String>,

    /// Request timeout in seconds (0 disables it)
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Proxy URL (http://, https:// or socks5://)
    #[arg(long, env = "BIVAC_PROXY", global = true)]
    pub proxy: Option<String>,

    /// Proxy username
    #[arg(long, requires = "proxy", global = true)]
    pub proxy_username: Option<String>,

    /// Proxy password
    #[arg(long, requires = "proxy_username", global = true)]
    pub proxy_password: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the manager is reachable and answers pong
    Ping,

    /// Show manager information
    Info,

    /// List volumes, or show details for the given volume IDs
    Volumes {
        /// Volume IDs to describe
        ids: Vec<String>,
    },

    /// Trigger a backup of one or more volumes
    Backup {
        /// Volume IDs to back up
        #[arg(required = true)]
        ids: Vec<String>,

        /// Back up even if the last backup is recent
        #[arg(short, long)]
        force: bool,
    },

    /// Restore a volume from a snapshot
    Restore {
        /// Volume ID
        volume: String,

        /// Snapshot name (e.g. `latest`)
        snapshot: String,

        /// Overwrite existing data
        #[arg(short, long)]
        force: bool,
    },

    /// Run a raw restic command on a volume's repository
    Restic {
        /// Volume ID
        #[arg(long)]
        volume: String,

        /// Restic arguments, e.g. `snapshots --compact`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Keep polling the manager and print volumes whenever they change
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 5000)]
        interval_ms: u64,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Pretty,
    /// Pretty-printed JSON
    Json,
    /// Single-line JSON
    JsonCompact,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact)
    }
}
