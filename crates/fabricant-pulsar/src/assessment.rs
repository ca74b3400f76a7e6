//! Turning risk metrics into findings
//!
//! Only two findings can block: a risk score above the configured threshold,
//! and a non-compliant asset when compliance checking is on. Counterparty and
//! oracle-integrity findings are advisory.

use crate::config::RiskOracleConfig;
use crate::types::{ComplianceStatus, RiskMetrics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Counterparty risk above this is reported when counterparty checks are on
pub const COUNTERPARTY_ADVISORY_LIMIT: f64 = 0.7;

/// Oracle integrity below this is reported when oracle checks are on
pub const MIN_ORACLE_INTEGRITY: f64 = 0.5;

/// One observation about one asset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFinding {
    RiskScoreExceeded { asset: String, score: f64, threshold: f64 },
    NonCompliant { asset: String },
    ElevatedCounterpartyRisk { asset: String, risk: f64 },
    LowOracleIntegrity { asset: String, integrity: f64 },
}

impl RiskFinding {
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            RiskFinding::RiskScoreExceeded { .. } | RiskFinding::NonCompliant { .. }
        )
    }

    pub fn asset(&self) -> &str {
        match self {
            RiskFinding::RiskScoreExceeded { asset, .. }
            | RiskFinding::NonCompliant { asset }
            | RiskFinding::ElevatedCounterpartyRisk { asset, .. }
            | RiskFinding::LowOracleIntegrity { asset, .. } => asset,
        }
    }
}

impl fmt::Display for RiskFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFinding::RiskScoreExceeded { asset, score, threshold } => write!(
                f,
                "Risk score {:.2} for {} exceeds threshold {:.2}",
                score, asset, threshold
            ),
            RiskFinding::NonCompliant { asset } => write!(f, "Asset {} is non-compliant", asset),
            RiskFinding::ElevatedCounterpartyRisk { asset, risk } => {
                write!(f, "Elevated counterparty risk {:.2} for {}", risk, asset)
            }
            RiskFinding::LowOracleIntegrity { asset, integrity } => {
                write!(f, "Low oracle integrity {:.2} for {}", integrity, asset)
            }
        }
    }
}

/// Findings for every asset in a lookup
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub findings: Vec<RiskFinding>,
    pub assets_checked: usize,
}

impl RiskAssessment {
    /// Evaluate metrics against the configured checks. Assets are visited in
    /// sorted order so the finding list is stable.
    pub fn evaluate(metrics: &HashMap<String, RiskMetrics>, config: &RiskOracleConfig) -> Self {
        let mut assets: Vec<&RiskMetrics> = metrics.values().collect();
        assets.sort_by(|a, b| a.asset.cmp(&b.asset));

        let mut findings = Vec::new();
        for m in assets {
            if let (Some(score), Some(threshold)) = (m.risk_score, config.risk_threshold) {
                if score > threshold {
                    findings.push(RiskFinding::RiskScoreExceeded {
                        asset: m.asset.clone(),
                        score,
                        threshold,
                    });
                }
            }

            if config.enable_compliance_check
                && m.compliance_status == Some(ComplianceStatus::NonCompliant)
            {
                findings.push(RiskFinding::NonCompliant {
                    asset: m.asset.clone(),
                });
            }

            if config.enable_counterparty_check {
                if let Some(risk) = m.counterparty_risk.filter(|r| *r > COUNTERPARTY_ADVISORY_LIMIT) {
                    findings.push(RiskFinding::ElevatedCounterpartyRisk {
                        asset: m.asset.clone(),
                        risk,
                    });
                }
            }

            if config.enable_oracle_check {
                if let Some(integrity) = m.oracle_integrity.filter(|i| *i < MIN_ORACLE_INTEGRITY) {
                    findings.push(RiskFinding::LowOracleIntegrity {
                        asset: m.asset.clone(),
                        integrity,
                    });
                }
            }
        }

        Self {
            findings,
            assets_checked: metrics.len(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.findings.iter().any(RiskFinding::is_blocking)
    }

    pub fn blocking_findings(&self) -> impl Iterator<Item = &RiskFinding> {
        self.findings.iter().filter(|f| f.is_blocking())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(list: Vec<RiskMetrics>) -> HashMap<String, RiskMetrics> {
        list.into_iter().map(|m| (m.asset.clone(), m)).collect()
    }

    #[test]
    fn test_score_above_threshold_blocks() {
        let config = RiskOracleConfig::with_threshold(0.7);
        let assessment = RiskAssessment::evaluate(
            &metrics(vec![
                RiskMetrics::unknown("safe").with_risk_score(0.7),
                RiskMetrics::unknown("risky").with_risk_score(0.71),
            ]),
            &config,
        );

        assert!(assessment.is_blocking());
        assert_eq!(assessment.findings.len(), 1);
        assert_eq!(assessment.findings[0].asset(), "risky");
    }

    #[test]
    fn test_no_threshold_never_blocks_on_score() {
        let config = RiskOracleConfig {
            enabled: true,
            ..RiskOracleConfig::default()
        };
        let assessment = RiskAssessment::evaluate(
            &metrics(vec![RiskMetrics::unknown("A").with_risk_score(1.0)]),
            &config,
        );
        assert!(!assessment.is_blocking());
    }

    #[test]
    fn test_non_compliance_only_blocks_when_enabled() {
        let flagged = metrics(vec![
            RiskMetrics::unknown("A").with_compliance(ComplianceStatus::NonCompliant)
        ]);

        let off = RiskOracleConfig::with_threshold(0.9);
        assert!(!RiskAssessment::evaluate(&flagged, &off).is_blocking());

        let on = RiskOracleConfig {
            enable_compliance_check: true,
            ..off
        };
        assert!(RiskAssessment::evaluate(&flagged, &on).is_blocking());
    }

    #[test]
    fn test_advisory_findings_do_not_block() {
        let config = RiskOracleConfig {
            enabled: true,
            enable_counterparty_check: true,
            enable_oracle_check: true,
            ..RiskOracleConfig::default()
        };
        let assessment = RiskAssessment::evaluate(
            &metrics(vec![RiskMetrics::unknown("A")
                .with_counterparty_risk(0.95)
                .with_oracle_integrity(0.1)]),
            &config,
        );

        assert_eq!(assessment.findings.len(), 2);
        assert!(!assessment.is_blocking());
    }

    #[test]
    fn test_unknown_metrics_produce_nothing() {
        let config = RiskOracleConfig {
            enable_compliance_check: true,
            enable_counterparty_check: true,
            enable_oracle_check: true,
            ..RiskOracleConfig::with_threshold(0.0)
        };
        let assessment =
            RiskAssessment::evaluate(&metrics(vec![RiskMetrics::unknown("A")]), &config);
        assert!(assessment.findings.is_empty());
        assert_eq!(assessment.assets_checked, 1);
    }
}
