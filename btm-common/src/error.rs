//! Common error types for the mapper

use thiserror::Error;

/// Common result type for mapper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the mapper crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited text could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP transport error while talking to a remote registry
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote registry answered but the answer is unusable
    #[error("Registry error: {0}")]
    Registry(String),

    /// Remote registry table has an unexpected shape (e.g. no CNPJ column)
    #[error("Registry data shape error: {0}")]
    RegistryShape(String),

    /// Required input column could not be resolved
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
