//! Error types for the ascend_core library.
//!
//! The computation modules never return errors: sparse or partial data is
//! modelled with `Option` and empty states. Only the boundary layers (entry
//! normalization, the JSON store, CSV export, config) produce an `Error`.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ascend_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An entry key or date argument that is not a `YYYY-MM-DD` calendar day
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Quest catalog lookup or validation error
    #[error("Quest catalog error: {0}")]
    Catalog(String),

    /// Data store error
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
