//! Risk metric types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Regulatory compliance status reported by the oracle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "compliant"),
            ComplianceStatus::NonCompliant => write!(f, "non-compliant"),
        }
    }
}

/// Risk metrics for one asset. Every signal is optional: the oracle may know
/// nothing about an asset, in which case all fields are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub asset: String,
    /// Aggregate risk score in `0.0..=1.0`
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub compliance_status: Option<ComplianceStatus>,
    /// Counterparty risk in `0.0..=1.0`
    #[serde(default)]
    pub counterparty_risk: Option<f64>,
    /// Price-oracle integrity in `0.0..=1.0` (1.0 = fully trusted)
    #[serde(default)]
    pub oracle_integrity: Option<f64>,
}

impl RiskMetrics {
    /// Metrics with every signal absent
    pub fn unknown(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            risk_score: None,
            compliance_status: None,
            counterparty_risk: None,
            oracle_integrity: None,
        }
    }

    /// True when the oracle supplied no signal at all
    pub fn is_unknown(&self) -> bool {
        self.risk_score.is_none()
            && self.compliance_status.is_none()
            && self.counterparty_risk.is_none()
            && self.oracle_integrity.is_none()
    }

    pub fn with_risk_score(mut self, score: f64) -> Self {
        self.risk_score = Some(score);
        self
    }

    pub fn with_compliance(mut self, status: ComplianceStatus) -> Self {
        self.compliance_status = Some(status);
        self
    }

    pub fn with_counterparty_risk(mut self, risk: f64) -> Self {
        self.counterparty_risk = Some(risk);
        self
    }

    pub fn with_oracle_integrity(mut self, integrity: f64) -> Self {
        self.oracle_integrity = Some(integrity);
        self
    }
}
