//! Seatwatch error type.

use thiserror::Error;

/// All errors produced inside the seatwatch crates.
#[derive(Debug, Error)]
pub enum SeatwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API key missing for provider '{0}'")]
    ApiKeyMissing(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SeatwatchError>;
