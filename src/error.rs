//! Error types for mampfsearch.

use thiserror::Error;

/// Library-level error type for mampfsearch operations.
#[derive(Error, Debug)]
pub enum MampfError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Collection not found: {0}")]
    IndexNotFound(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Failed to parse model output: {0}")]
    Parse(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for mampfsearch operations.
pub type Result<T> = std::result::Result<T, MampfError>;
