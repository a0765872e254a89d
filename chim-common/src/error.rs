//! Common error types for CHIM

use thiserror::Error;

/// Common result type for CHIM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CHIM crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML config file could not be parsed
    #[error("Config file parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
