use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("Invalid stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid profile: {0}")]
    Profile(#[from] formfill_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Home directory not found")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, Error>;
