//! Error types for amman-config
//!
//! This module defines all error types that can occur while building, loading
//! or exporting a validator configuration.

use thiserror::Error;

/// Main error type for amman-config operations
#[derive(Error, Debug)]
pub enum AmmanError {
    /// Configuration errors (parsing, validation)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization errors while exporting the configuration
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors (ledger directory allocation, config file reads)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AmmanError {
    fn from(err: serde_json::Error) -> Self {
        AmmanError::Serialization(err.to_string())
    }
}

/// A TOML file that fails to parse is a configuration problem, not an export one
impl From<toml::de::Error> for AmmanError {
    fn from(err: toml::de::Error) -> Self {
        AmmanError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for AmmanError {
    fn from(err: toml::ser::Error) -> Self {
        AmmanError::Serialization(err.to_string())
    }
}

/// Type alias for Results using AmmanError
pub type Result<T> = std::result::Result<T, AmmanError>;
