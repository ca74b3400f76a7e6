//! Error types for the guard

use fabricant_core::CoreError;
use fabricant_pulsar::OracleError;
use thiserror::Error;

/// Errors surfaced by the guard and executor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("Risk lookup failed: {0}")]
    RiskLookup(#[from] OracleError),

    #[error("Risk checks are enabled but no risk oracle is attached")]
    RiskOracleMissing,
}

pub type GuardResult<T> = std::result::Result<T, GuardError>;
