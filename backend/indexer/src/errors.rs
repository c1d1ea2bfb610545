//! Indexer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON-RPC error that retrying cannot fix.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// `getEvents` answered with neither a result nor an error.
    #[error("Empty result from getEvents")]
    EmptyResult,

    /// An event whose topics or value do not have the registry's shape.
    #[error("Cannot decode event {event_id}: {reason}")]
    Decode { event_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, IndexerError>;
