//! Execution coordinator
//!
//! Gates a transaction on the guard verdict, then on asset risk. The
//! transaction handed in is never modified; the outcome carries a derived
//! copy with its final status.

use crate::config::{GuardConfig, Mode};
use crate::error::{GuardError, GuardResult};
use crate::guard::Guard;
use crate::pattern::{PatternId, ValidationResult};
use fabricant_core::{Transaction, TransactionStatus};
use fabricant_pulsar::{RiskAssessment, RiskFinding, RiskOracle, RiskOracleConfig};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Why a transaction was not executed
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// Guard verdict was invalid
    Blocked { patterns: Vec<PatternId> },
    /// One or more assets failed the risk checks
    RiskBlocked { findings: Vec<RiskFinding> },
    /// Risk data could not be obtained and fallback is off
    RiskLookupFailed { error: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Blocked { patterns } => {
                let codes: Vec<&str> = patterns.iter().map(PatternId::code).collect();
                write!(f, "blocked by {}", codes.join(", "))
            }
            FailureReason::RiskBlocked { findings } => {
                let reasons: Vec<String> = findings.iter().map(ToString::to_string).collect();
                write!(f, "risk check failed: {}", reasons.join("; "))
            }
            FailureReason::RiskLookupFailed { error } => write!(f, "risk lookup failed: {}", error),
        }
    }
}

/// Result of one [`Executor::execute`] call
#[derive(Clone, Debug, Serialize)]
pub struct ExecutionOutcome {
    /// Derived copy with status `executed` or `failed`
    pub transaction: Transaction,
    pub validation: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl ExecutionOutcome {
    fn executed(
        transaction: &Transaction,
        validation: ValidationResult,
        risk: Option<RiskAssessment>,
    ) -> Self {
        Self {
            transaction: transaction.with_status(TransactionStatus::Executed),
            validation,
            risk,
            failure: None,
        }
    }

    fn failed(
        transaction: &Transaction,
        validation: ValidationResult,
        risk: Option<RiskAssessment>,
        reason: FailureReason,
    ) -> Self {
        tracing::info!(tx = %transaction.id, %reason, "transaction failed");
        Self {
            transaction: transaction.with_status(TransactionStatus::Failed),
            validation,
            risk,
            failure: Some(reason),
        }
    }

    pub fn is_executed(&self) -> bool {
        self.transaction.status == TransactionStatus::Executed
    }
}

/// Coordinates guard validation and risk gating
#[derive(Clone)]
pub struct Executor {
    guard: Arc<Guard>,
    oracle: Option<Arc<RiskOracle>>,
}

impl Executor {
    pub fn new(guard: Arc<Guard>) -> Self {
        Self { guard, oracle: None }
    }

    pub fn with_oracle(mut self, oracle: Arc<RiskOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn guard(&self) -> &Arc<Guard> {
        &self.guard
    }

    pub fn oracle(&self) -> Option<&Arc<RiskOracle>> {
        self.oracle.as_ref()
    }

    /// Validate, gate on risk, and mark the transaction
    pub async fn execute(&self, transaction: &Transaction) -> ExecutionOutcome {
        let validation = self.guard.validate_transaction(transaction);
        if !validation.is_valid {
            let reason = FailureReason::Blocked {
                patterns: validation.blocked_by.clone(),
            };
            return ExecutionOutcome::failed(transaction, validation, None, reason);
        }

        let config = self.guard.config();
        let Some(risk_config) = config.active_risk() else {
            return ExecutionOutcome::executed(transaction, validation, None);
        };
        if transaction.asset_addresses.is_empty() {
            return ExecutionOutcome::executed(transaction, validation, None);
        }

        match self.assess_risk(transaction, risk_config).await {
            Ok(assessment) => self.gate_on_assessment(transaction, validation, assessment, &config),
            Err(e) if risk_config.fallback_on_error => {
                tracing::warn!(tx = %transaction.id, error = %e, "risk lookup failed, falling back");
                ExecutionOutcome::executed(transaction, validation, None)
            }
            Err(e) => {
                let reason = FailureReason::RiskLookupFailed {
                    error: e.to_string(),
                };
                ExecutionOutcome::failed(transaction, validation, None, reason)
            }
        }
    }

    async fn assess_risk(
        &self,
        transaction: &Transaction,
        risk_config: &RiskOracleConfig,
    ) -> GuardResult<RiskAssessment> {
        let oracle = self.oracle.as_ref().ok_or(GuardError::RiskOracleMissing)?;
        // Current config, so TTL and retry updates apply without a new oracle
        let metrics = oracle
            .get_batch_risk_metrics_with(&transaction.asset_addresses, risk_config)
            .await?;
        Ok(RiskAssessment::evaluate(&metrics, risk_config))
    }

    fn gate_on_assessment(
        &self,
        transaction: &Transaction,
        validation: ValidationResult,
        assessment: RiskAssessment,
        config: &GuardConfig,
    ) -> ExecutionOutcome {
        for advisory in assessment.findings.iter().filter(|f| !f.is_blocking()) {
            tracing::info!(tx = %transaction.id, "{}", advisory);
        }

        if assessment.is_blocking() && config.mode == Mode::Block {
            let reason = FailureReason::RiskBlocked {
                findings: assessment.blocking_findings().cloned().collect(),
            };
            return ExecutionOutcome::failed(transaction, validation, Some(assessment), reason);
        }

        ExecutionOutcome::executed(transaction, validation, Some(assessment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::TOKEN_PROGRAM_ID;
    use fabricant_core::{AccountMeta, Instruction};

    #[tokio::test]
    async fn test_invalid_verdict_fails_transaction() {
        let executor = Executor::new(Arc::new(Guard::default()));
        let tx = Transaction::new("tx").with_instruction(Instruction::new(
            TOKEN_PROGRAM_ID,
            vec![AccountMeta::writable("Mint")],
            vec![6, 1, 0],
        ));

        let outcome = executor.execute(&tx).await;

        assert!(!outcome.is_executed());
        assert_eq!(outcome.transaction.status, TransactionStatus::Failed);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(
            outcome.failure,
            Some(FailureReason::Blocked {
                patterns: vec![PatternId::FreezeKill]
            })
        );
    }

    #[tokio::test]
    async fn test_clean_transaction_executes() {
        let executor = Executor::new(Arc::new(Guard::default()));
        let outcome = executor.execute(&Transaction::new("tx")).await;

        assert!(outcome.is_executed());
        assert!(outcome.failure.is_none());
        assert!(outcome.risk.is_none());
    }

    #[tokio::test]
    async fn test_risk_enabled_without_oracle() {
        let guard = Guard::new(GuardConfig::default().with_risk(RiskOracleConfig::with_threshold(0.5)));
        let executor = Executor::new(Arc::new(guard));
        let tx = Transaction::new("tx").with_assets(["Asset1"]);

        let outcome = executor.execute(&tx).await;
        assert!(matches!(
            outcome.failure,
            Some(FailureReason::RiskLookupFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_assets_skips_risk() {
        let guard = Guard::new(GuardConfig::default().with_risk(RiskOracleConfig::with_threshold(0.5)));
        let executor = Executor::new(Arc::new(guard));

        assert!(executor.execute(&Transaction::new("tx")).await.is_executed());
    }
}
