//! Error types for procdocs-core

use thiserror::Error;

/// Result type alias using procdocs-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in procdocs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading the remote record table failed
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    /// Inserting or deleting remote records failed
    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    /// Supabase auth error
    #[error("Auth error: {0}")]
    Auth(String),

    /// Supabase auth answered with a 4xx status
    #[error("Auth error: {0}")]
    AuthRejected(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid or missing configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
