use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use procdocs_core::config::EmptyRemotePolicy;

#[derive(Parser)]
#[command(name = "procdocs")]
#[command(about = "Look up factory process documentation, online or offline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the JSON config file
    #[arg(long = "config-file", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge the remote process table into the local cache
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List cached processes, oldest first
    List {
        /// Number of processes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show cached processes by id or title
    Show {
        /// Record id, or part of a title
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a process in the remote table, then sync
    #[command(alias = "new")]
    Add {
        /// Process title
        #[arg(long)]
        title: String,
        /// Steps read to the operator
        #[arg(long)]
        description: String,
        /// Image files to attach (jpg, png, gif, webp, heic)
        #[arg(long = "image", value_name = "PATH", required = true)]
        images: Vec<PathBuf>,
    },
    /// Delete processes from the remote table
    Delete {
        /// Record ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show cache, connectivity and session status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign in to the Supabase project
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Configure the Supabase connection
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum EmptyRemoteArg {
    /// Empty the cache when the remote table has no rows
    Wipe,
    /// Keep cached records when the remote table has no rows
    Preserve,
}

impl From<EmptyRemoteArg> for EmptyRemotePolicy {
    fn from(value: EmptyRemoteArg) -> Self {
        match value {
            EmptyRemoteArg::Wipe => Self::Wipe,
            EmptyRemoteArg::Preserve => Self::Preserve,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Remote table name (default: procesos)
        #[arg(long, value_name = "NAME")]
        table: Option<String>,
        /// What sync does when the remote table is empty
        #[arg(long, value_enum)]
        empty_remote: Option<EmptyRemoteArg>,
        /// HTTP timeout in seconds (0 disables)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password and store the session locally
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account with email and password
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password (at least 6 characters)
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Repeat the password to guard against typos
        #[arg(long, value_name = "PASSWORD")]
        confirm_password: Option<String>,
    },
    /// Email a password reset link
    ResetPassword {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// URL the reset link should open
        #[arg(long, value_name = "URL")]
        redirect_to: Option<String>,
    },
    /// Show the stored session
    Status,
    /// Sign out and clear the stored session
    Logout,
}
