//! Risk oracle configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Risk oracle settings carried inside the guard configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskOracleConfig {
    /// Consult the oracle before execution
    pub enabled: bool,

    /// Block when any asset's risk score is strictly above this value
    pub risk_threshold: Option<f64>,

    /// Block assets reported as non-compliant
    pub enable_compliance_check: bool,

    /// Report elevated counterparty risk (advisory)
    pub enable_counterparty_check: bool,

    /// Report degraded price-oracle integrity (advisory)
    pub enable_oracle_check: bool,

    /// Cache entry lifetime (ms)
    pub cache_ttl_ms: u64,

    /// Proceed as if no risk data existed when the lookup fails
    pub fallback_on_error: bool,

    /// Per-attempt timeout (ms)
    pub timeout_ms: u64,

    /// Total attempts per lookup, including the first
    pub max_attempts: u32,

    /// Base delay between attempts (ms); attempt `n` waits `n * retry_delay_ms`
    pub retry_delay_ms: u64,
}

impl Default for RiskOracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            risk_threshold: None,
            enable_compliance_check: false,
            enable_counterparty_check: false,
            enable_oracle_check: false,
            cache_ttl_ms: 60_000, // 1 minute
            fallback_on_error: false,
            timeout_ms: 30_000,
            max_attempts: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl RiskOracleConfig {
    /// Enabled configuration with the given block threshold
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            enabled: true,
            risk_threshold: Some(threshold),
            ..Self::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RiskOracleConfig::default();
        assert!(!config.enabled);
        assert!(!config.fallback_on_error);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: RiskOracleConfig =
            serde_json::from_str(r#"{"enabled": true, "risk_threshold": 0.7}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.risk_threshold, Some(0.7));
        assert_eq!(config.timeout_ms, 30_000);
    }
}
