//! Validation policy
//!
//! Turns detector output and custom-rule results into a verdict:
//!
//! ```text
//! emergency stop? ── yes ──► invalid (P-000)
//!       │ no
//!       ▼
//! detectors ──► custom rules ──► severity × tolerance ──► blocked_by
//! ```
//!
//! | severity | strict | moderate | permissive              |
//! |----------|--------|----------|-------------------------|
//! | Critical | block  | block    | only Mint/Freeze Kill   |
//! | Warning  | -      | -        | -                       |
//! | Alert    | -      | -        | -                       |

use crate::config::{GuardConfig, Mode, RiskTolerance};
use crate::detector::{PatternDetector, TokenProgramDetector};
use crate::pattern::{PatternId, SecurityWarning, Severity, ValidationResult};
use fabricant_core::Transaction;

/// Validate with the built-in detector only
pub fn validate_transaction(transaction: &Transaction, config: &GuardConfig) -> ValidationResult {
    evaluate(transaction, config, &[&TokenProgramDetector])
}

/// Validate with an explicit detector set, run in order
pub fn evaluate(
    transaction: &Transaction,
    config: &GuardConfig,
    detectors: &[&dyn PatternDetector],
) -> ValidationResult {
    if config.emergency_stop {
        return ValidationResult::emergency_stop();
    }

    let mut warnings = Vec::new();

    if config.enable_pattern_detection {
        for detector in detectors {
            let found = detector.inspect(transaction);
            if !found.is_empty() {
                tracing::debug!(
                    detector = detector.name(),
                    count = found.len(),
                    tx = %transaction.id,
                    "patterns detected"
                );
            }
            warnings.extend(found);
        }
    }

    warnings.extend(evaluate_custom_rules(transaction, config));

    let blocked_by = determine_blocking(&warnings, config);
    let result = ValidationResult::new(warnings, blocked_by);

    if !result.is_valid {
        tracing::info!(tx = %transaction.id, "{}", result.summary());
    }

    result
}

/// Warnings from enabled custom rules, in configured order
pub fn evaluate_custom_rules(transaction: &Transaction, config: &GuardConfig) -> Vec<SecurityWarning> {
    config
        .custom_rules
        .iter()
        .filter(|rule| rule.enabled)
        .filter_map(|rule| match rule.check(transaction) {
            Ok(true) => None,
            Ok(false) => Some(SecurityWarning::new(
                PatternId::Custom(rule.id.clone()),
                Severity::Warning,
                format!("Custom rule violation: {}", rule.name),
            )),
            Err(e) => {
                tracing::warn!(rule = %rule.id, error = %e, "custom rule failed, skipping");
                None
            }
        })
        .collect()
}

/// Patterns that block under the configured mode and tolerance,
/// deduplicated in first-seen order
pub fn determine_blocking(warnings: &[SecurityWarning], config: &GuardConfig) -> Vec<PatternId> {
    if config.mode == Mode::Warn {
        return Vec::new();
    }

    let mut blocked: Vec<PatternId> = Vec::new();
    for warning in warnings {
        if should_block(&warning.pattern_id, warning.severity, config.risk_tolerance)
            && !blocked.contains(&warning.pattern_id)
        {
            blocked.push(warning.pattern_id.clone());
        }
    }
    blocked
}

/// The severity × tolerance matrix
pub fn should_block(pattern: &PatternId, severity: Severity, tolerance: RiskTolerance) -> bool {
    match (severity, tolerance) {
        (Severity::Critical, RiskTolerance::Strict | RiskTolerance::Moderate) => true,
        (Severity::Critical, RiskTolerance::Permissive) => pattern.is_authority_kill(),
        (Severity::Warning | Severity::Alert, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::TOKEN_PROGRAM_ID;
    use crate::rules::{CustomRule, RuleError};
    use fabricant_core::{AccountMeta, Instruction};

    fn ix(data: Vec<u8>) -> Instruction {
        Instruction::new(
            TOKEN_PROGRAM_ID,
            vec![AccountMeta::writable("Mint"), AccountMeta::readonly("Other")],
            data,
        )
    }

    fn mint_kill_tx() -> Transaction {
        Transaction::new("tx").with_instruction(ix(vec![6, 0, 0]))
    }

    fn warning(pattern: PatternId, severity: Severity) -> SecurityWarning {
        SecurityWarning::new(pattern, severity, "test")
    }

    #[test]
    fn test_critical_blocks_in_moderate() {
        let result = validate_transaction(&mint_kill_tx(), &GuardConfig::default());

        assert!(!result.is_valid);
        assert_eq!(result.blocked_by, vec![PatternId::MintKill]);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_warn_mode_never_blocks() {
        let config = GuardConfig::default()
            .with_mode(Mode::Warn)
            .with_risk_tolerance(RiskTolerance::Strict);
        let result = validate_transaction(&mint_kill_tx(), &config);

        assert!(result.is_valid);
        assert!(result.blocked_by.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_alert_and_warning_do_not_block() {
        let tx = Transaction::new("tx")
            .with_instruction(ix(vec![9]))
            .with_instruction(ix(vec![6, 0, 1]));
        let config = GuardConfig::default().with_risk_tolerance(RiskTolerance::Strict);
        let result = validate_transaction(&tx, &config);

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_matrix() {
        use RiskTolerance::*;
        for tolerance in [Strict, Moderate, Permissive] {
            assert!(should_block(&PatternId::MintKill, Severity::Critical, tolerance));
            assert!(should_block(&PatternId::FreezeKill, Severity::Critical, tolerance));
            assert!(!should_block(&PatternId::SignerMismatch, Severity::Warning, tolerance));
            assert!(!should_block(&PatternId::DangerousClose, Severity::Alert, tolerance));
        }

        // A critical warning from some other pattern only passes under permissive
        let other = PatternId::Custom("exotic".into());
        assert!(should_block(&other, Severity::Critical, Strict));
        assert!(should_block(&other, Severity::Critical, Moderate));
        assert!(!should_block(&other, Severity::Critical, Permissive));
    }

    #[test]
    fn test_blocking_is_deduplicated() {
        let warnings = vec![
            warning(PatternId::MintKill, Severity::Critical),
            warning(PatternId::FreezeKill, Severity::Critical),
            warning(PatternId::MintKill, Severity::Critical),
        ];
        let blocked = determine_blocking(&warnings, &GuardConfig::default());
        assert_eq!(blocked, vec![PatternId::MintKill, PatternId::FreezeKill]);
    }

    #[test]
    fn test_emergency_stop_short_circuits() {
        let config = GuardConfig {
            emergency_stop: true,
            ..GuardConfig::default()
        }
        .with_rule(CustomRule::new("never", "Never runs", |_| {
            panic!("rules must not run during an emergency stop")
        }));

        let result = validate_transaction(&Transaction::new("empty"), &config);
        assert!(!result.is_valid);
        assert!(result.is_emergency_stop());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_detection_can_be_disabled() {
        let config = GuardConfig {
            enable_pattern_detection: false,
            ..GuardConfig::default()
        };
        let result = validate_transaction(&mint_kill_tx(), &config);
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_custom_rules() {
        let config = GuardConfig::default()
            .with_rule(CustomRule::new("passes", "Always passes", |_| Ok(true)))
            .with_rule(CustomRule::new("fails", "Always fails", |_| Ok(false)))
            .with_rule(CustomRule::new("broken", "Broken rule", |_| {
                Err(RuleError::Evaluation("boom".into()))
            }))
            .with_rule(CustomRule::new("off", "Disabled", |_| Ok(false)).disabled());

        let result = validate_transaction(&Transaction::new("tx"), &config);

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].pattern_id, PatternId::Custom("fails".into()));
        assert_eq!(result.warnings[0].severity, Severity::Warning);
        assert_eq!(result.warnings[0].message, "Custom rule violation: Always fails");
    }

    #[test]
    fn test_custom_warnings_follow_detector_warnings() {
        let config =
            GuardConfig::default().with_rule(CustomRule::new("fails", "Always fails", |_| Ok(false)));
        let result = validate_transaction(&mint_kill_tx(), &config);

        assert_eq!(result.warnings[0].pattern_id, PatternId::MintKill);
        assert_eq!(result.warnings[1].pattern_id, PatternId::Custom("fails".into()));
    }
}
