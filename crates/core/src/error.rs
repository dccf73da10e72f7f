//! Error types for the Homeroom core crate.

use thiserror::Error;

/// Top-level error type for all Homeroom core operations.
#[derive(Debug, Error)]
pub enum HomeroomError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("notification error: {0}")]
    Notify(String),

    #[error("fetch gate error: {0}")]
    Gate(String),
}

/// A convenience Result alias that defaults to [`HomeroomError`].
pub type Result<T> = std::result::Result<T, HomeroomError>;
