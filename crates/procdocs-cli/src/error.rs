use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] procdocs_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("No cached process matches '{0}'. Run `procdocs sync` to refresh the cache.")]
    NoMatch(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Not signed in. Run `procdocs auth login` first.")]
    NotSignedIn,
    #[error(
        "Supabase is not configured. Run `procdocs config init` or set PROCDOCS_SUPABASE_URL and PROCDOCS_SUPABASE_ANON_KEY."
    )]
    RemoteNotConfigured,
}
