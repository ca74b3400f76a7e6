//! Pattern detection over instruction lists
//!
//! Detectors are pure: no I/O, no shared state, same transaction in, same
//! warnings out. Malformed payloads are skipped, never raised.

use crate::instruction::{is_token_program, AccountRoles, AuthorityType, NewAuthority, TokenInstruction};
use crate::pattern::{PatternId, SecurityWarning, Severity};
use fabricant_core::{Instruction, Transaction};
use std::collections::HashSet;

/// A source of warnings derived from instruction contents
pub trait PatternDetector: Send + Sync {
    /// Detector name, for logs
    fn name(&self) -> &str;

    /// Warnings implied by the transaction, in instruction order
    fn inspect(&self, transaction: &Transaction) -> Vec<SecurityWarning>;
}

/// Built-in detector for SPL token program instructions
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenProgramDetector;

impl TokenProgramDetector {
    pub fn new() -> Self {
        Self
    }

    fn inspect_instruction(
        &self,
        instruction: &Instruction,
        signers: &HashSet<&str>,
        warnings: &mut Vec<SecurityWarning>,
    ) {
        let decoded = match TokenInstruction::decode(&instruction.data) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(program = %instruction.program_id, error = %e, "skipping malformed instruction");
                return;
            }
        };

        let account = instruction.primary_account().map(|a| a.pubkey.as_str());

        match decoded {
            TokenInstruction::SetAuthority {
                authority_type,
                new_authority: NewAuthority::Cleared,
            } => match authority_type {
                AuthorityType::MintTokens => warnings.push(
                    SecurityWarning::new(
                        PatternId::MintKill,
                        Severity::Critical,
                        "CRITICAL: Permanently disabling mint authority. This action is irreversible!",
                    )
                    .with_account(account),
                ),
                AuthorityType::FreezeAccount => warnings.push(
                    SecurityWarning::new(
                        PatternId::FreezeKill,
                        Severity::Critical,
                        "CRITICAL: Permanently disabling freeze authority. You will lose freeze capability!",
                    )
                    .with_account(account),
                ),
                _ => {}
            },

            TokenInstruction::SetAuthority {
                new_authority: NewAuthority::Replaced(_),
                ..
            } => {
                if let Some(candidate) = instruction.new_authority_candidate() {
                    if !signers.contains(candidate.pubkey.as_str()) {
                        warnings.push(
                            SecurityWarning::new(
                                PatternId::SignerMismatch,
                                Severity::Warning,
                                format!(
                                    "WARNING: New authority ({}) is not a current signer. Risk of lockout!",
                                    candidate.pubkey
                                ),
                            )
                            .with_account(account),
                        );
                    }
                }
            }

            TokenInstruction::CloseAccount => warnings.push(
                SecurityWarning::new(
                    PatternId::DangerousClose,
                    Severity::Alert,
                    "ALERT: Closing account. Ensure balance has been transferred or is zero!",
                )
                .with_account(account),
            ),

            TokenInstruction::Other(_) => {}
        }
    }
}

impl PatternDetector for TokenProgramDetector {
    fn name(&self) -> &str {
        "token-program"
    }

    fn inspect(&self, transaction: &Transaction) -> Vec<SecurityWarning> {
        let mut warnings = Vec::new();
        if transaction.instructions.is_empty() {
            return warnings;
        }

        let signers = transaction.signer_set();
        for instruction in transaction
            .instructions
            .iter()
            .filter(|ix| is_token_program(&ix.program_id))
        {
            self.inspect_instruction(instruction, &signers, &mut warnings);
        }

        warnings
    }
}

/// Run the built-in token-program detector
pub fn analyze_transaction(transaction: &Transaction) -> Vec<SecurityWarning> {
    TokenProgramDetector.inspect(transaction)
}
