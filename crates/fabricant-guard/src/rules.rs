//! Custom validation rules
//!
//! A rule is a named predicate over a transaction. `Ok(false)` is a
//! violation; `Err` means the rule itself failed and is skipped.

use fabricant_core::Transaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure inside a custom rule predicate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule evaluation failed: {0}")]
    Evaluation(String),

    #[error("Rule is not applicable: {0}")]
    NotApplicable(String),
}

/// Predicate signature for custom rules
pub type RulePredicate = dyn Fn(&Transaction) -> Result<bool, RuleError> + Send + Sync;

/// User-supplied validation rule
#[derive(Clone)]
pub struct CustomRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    predicate: Arc<RulePredicate>,
}

impl CustomRule {
    pub fn new<F>(id: impl Into<String>, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Transaction) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            predicate: Arc::new(predicate),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Evaluate the predicate
    pub fn check(&self, transaction: &Transaction) -> Result<bool, RuleError> {
        (self.predicate)(transaction)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Declarative rule, as written in configuration files
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    /// At most `limit` instructions
    MaxInstructions { limit: usize },
    /// Every instruction targets one of `programs`
    ProgramAllowlist { programs: Vec<String> },
    /// At least one signer
    RequireSigners,
}

impl RuleSpec {
    pub fn id(&self) -> &'static str {
        match self {
            RuleSpec::MaxInstructions { .. } => "max-instructions",
            RuleSpec::ProgramAllowlist { .. } => "program-allowlist",
            RuleSpec::RequireSigners => "require-signers",
        }
    }

    /// Build the executable rule
    pub fn into_rule(self) -> CustomRule {
        let id = self.id();
        match self {
            RuleSpec::MaxInstructions { limit } => CustomRule::new(
                id,
                format!("At most {} instructions", limit),
                move |tx| Ok(tx.instructions.len() <= limit),
            ),
            RuleSpec::ProgramAllowlist { programs } => CustomRule::new(
                id,
                "Only allow-listed programs",
                move |tx| {
                    if programs.is_empty() {
                        return Err(RuleError::NotApplicable("empty allowlist".into()));
                    }
                    Ok(tx
                        .instructions
                        .iter()
                        .all(|ix| programs.iter().any(|p| p == &ix.program_id)))
                },
            ),
            RuleSpec::RequireSigners => {
                CustomRule::new(id, "Transaction must be signed", |tx| Ok(!tx.signers.is_empty()))
            }
        }
    }
}

impl From<RuleSpec> for CustomRule {
    fn from(spec: RuleSpec) -> Self {
        spec.into_rule()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabricant_core::Instruction;

    fn tx_with(programs: &[&str]) -> Transaction {
        programs.iter().fold(Transaction::new("tx"), |tx, p| {
            tx.with_instruction(Instruction::new(*p, Vec::new(), vec![0]))
        })
    }

    #[test]
    fn test_max_instructions() {
        let rule: CustomRule = RuleSpec::MaxInstructions { limit: 2 }.into();
        assert_eq!(rule.id, "max-instructions");
        assert_eq!(rule.check(&tx_with(&["A", "B"])), Ok(true));
        assert_eq!(rule.check(&tx_with(&["A", "B", "C"])), Ok(false));
    }

    #[test]
    fn test_program_allowlist() {
        let rule = RuleSpec::ProgramAllowlist {
            programs: vec!["A".into()],
        }
        .into_rule();
        assert_eq!(rule.check(&tx_with(&["A", "A"])), Ok(true));
        assert_eq!(rule.check(&tx_with(&["A", "B"])), Ok(false));

        let empty = RuleSpec::ProgramAllowlist { programs: Vec::new() }.into_rule();
        assert!(empty.check(&tx_with(&["A"])).is_err());
    }

    #[test]
    fn test_require_signers() {
        let rule = RuleSpec::RequireSigners.into_rule();
        assert_eq!(rule.check(&Transaction::new("tx")), Ok(false));
        assert_eq!(rule.check(&Transaction::new("tx").with_signer("Alice")), Ok(true));
    }

    #[test]
    fn test_rule_spec_from_toml() {
        #[derive(Deserialize)]
        struct File {
            rules: Vec<RuleSpec>,
        }

        let file: File = toml::from_str(
            r#"
            [[rules]]
            kind = "max_instructions"
            limit = 4

            [[rules]]
            kind = "require_signers"
            "#,
        )
        .unwrap();

        assert_eq!(
            file.rules,
            vec![RuleSpec::MaxInstructions { limit: 4 }, RuleSpec::RequireSigners]
        );
    }
}
