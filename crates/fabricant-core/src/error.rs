//! Error types for Fabricant core operations

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while constructing core values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Network name is not one of the supported clusters
    #[error("Unknown network: {0} (expected one of mainnet-beta, devnet, testnet)")]
    UnknownNetwork(String),

    /// A configuration field holds a value outside its domain
    #[error("Invalid configuration for `{field}`: {message}")]
    InvalidConfig { field: String, message: String },

    /// Transaction could not be parsed from its wire form
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidConfig`]
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedTransaction(err.to_string())
    }
}
