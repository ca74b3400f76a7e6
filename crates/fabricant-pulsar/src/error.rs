//! Error types for the risk oracle

use thiserror::Error;

/// Risk oracle errors.
///
/// `Clone` so that one in-flight result can be handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Risk gateway returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to decode risk response: {0}")]
    Decode(String),

    #[error("Risk lookup timed out after {0} ms")]
    Timeout(u64),

    #[error("Risk lookup failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<OracleError> },

    #[error("Invalid risk gateway endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Risk oracle not configured")]
    NotConfigured,
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OracleError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            OracleError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            OracleError::Transport(err.to_string())
        }
    }
}
