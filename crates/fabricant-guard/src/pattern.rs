//! Pattern identifiers, severities, warnings and verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Warning severity levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Alert,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Alert => write!(f, "ALERT"),
        }
    }
}

/// Identifier of the pattern behind a warning.
///
/// Built-in patterns are matched exhaustively; `Custom` carries the id of a
/// user-supplied rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PatternId {
    /// Emergency-stop sentinel
    EmergencyStop,
    MintKill,
    FreezeKill,
    SignerMismatch,
    DangerousClose,
    Custom(String),
}

/// Built-in instruction patterns, in code order
pub const BUILTIN_PATTERNS: [PatternId; 4] = [
    PatternId::MintKill,
    PatternId::FreezeKill,
    PatternId::SignerMismatch,
    PatternId::DangerousClose,
];

impl PatternId {
    /// Stable external code (`P-101` ...) or the custom rule id
    pub fn code(&self) -> &str {
        match self {
            PatternId::EmergencyStop => "P-000",
            PatternId::MintKill => "P-101",
            PatternId::FreezeKill => "P-102",
            PatternId::SignerMismatch => "P-103",
            PatternId::DangerousClose => "P-104",
            PatternId::Custom(id) => id,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "P-000" => PatternId::EmergencyStop,
            "P-101" => PatternId::MintKill,
            "P-102" => PatternId::FreezeKill,
            "P-103" => PatternId::SignerMismatch,
            "P-104" => PatternId::DangerousClose,
            other => PatternId::Custom(other.to_string()),
        }
    }

    /// Short human name
    pub fn title(&self) -> &str {
        match self {
            PatternId::EmergencyStop => "Emergency Stop",
            PatternId::MintKill => "Mint Kill",
            PatternId::FreezeKill => "Freeze Kill",
            PatternId::SignerMismatch => "Signer Mismatch",
            PatternId::DangerousClose => "Dangerous Close",
            PatternId::Custom(id) => id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            PatternId::EmergencyStop => "All operations halted by operator",
            PatternId::MintKill => "Mint authority permanently disabled",
            PatternId::FreezeKill => "Freeze authority permanently disabled",
            PatternId::SignerMismatch => "Authority handed to an identity that did not sign",
            PatternId::DangerousClose => "Token account closed; remaining balance may be lost",
            PatternId::Custom(_) => "Custom validation rule violated",
        }
    }

    /// Severity the built-in detector assigns to this pattern
    pub fn default_severity(&self) -> Severity {
        match self {
            PatternId::EmergencyStop | PatternId::MintKill | PatternId::FreezeKill => {
                Severity::Critical
            }
            PatternId::SignerMismatch | PatternId::Custom(_) => Severity::Warning,
            PatternId::DangerousClose => Severity::Alert,
        }
    }

    /// Irreversible authority revocation
    pub fn is_authority_kill(&self) -> bool {
        matches!(self, PatternId::MintKill | PatternId::FreezeKill)
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for PatternId {
    fn from(code: String) -> Self {
        PatternId::from_code(&code)
    }
}

impl From<PatternId> for String {
    fn from(pattern: PatternId) -> Self {
        pattern.code().to_string()
    }
}

/// One detected issue
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityWarning {
    pub pattern_id: PatternId,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_account: Option<String>,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl SecurityWarning {
    pub fn new(pattern_id: PatternId, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            pattern_id,
            severity,
            message: message.into(),
            affected_account: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_account(mut self, account: Option<&str>) -> Self {
        self.affected_account = account.map(str::to_string);
        self
    }
}

impl fmt::Display for SecurityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.severity, self.pattern_id, self.message)?;
        if let Some(account) = &self.affected_account {
            write!(f, " (account {})", account)?;
        }
        Ok(())
    }
}

/// Verdict of one validation call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<SecurityWarning>,
    /// Patterns that caused blocking, deduplicated, in first-seen order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<PatternId>,
}

impl ValidationResult {
    /// Build a verdict; validity follows from the blocking set
    pub fn new(warnings: Vec<SecurityWarning>, blocked_by: Vec<PatternId>) -> Self {
        Self {
            is_valid: blocked_by.is_empty(),
            warnings,
            blocked_by,
        }
    }

    /// Verdict returned while the emergency stop is engaged
    pub fn emergency_stop() -> Self {
        let warning = SecurityWarning::new(
            PatternId::EmergencyStop,
            Severity::Critical,
            "EMERGENCY STOP: All operations are halted",
        );
        Self::new(vec![warning], vec![PatternId::EmergencyStop])
    }

    pub fn is_emergency_stop(&self) -> bool {
        self.blocked_by.contains(&PatternId::EmergencyStop)
    }

    pub fn has_pattern(&self, pattern: &PatternId) -> bool {
        self.warnings.iter().any(|w| &w.pattern_id == pattern)
    }

    /// One-line explanation of the verdict
    pub fn summary(&self) -> String {
        if self.is_valid {
            return format!("allowed with {} warning(s)", self.warnings.len());
        }
        let patterns: Vec<String> = self
            .blocked_by
            .iter()
            .map(|p| format!("{} ({})", p.code(), p.title()))
            .collect();
        format!("blocked by {}", patterns.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for pattern in BUILTIN_PATTERNS.iter().chain([PatternId::EmergencyStop].iter()) {
            assert_eq!(&PatternId::from_code(pattern.code()), pattern);
        }
        assert_eq!(
            PatternId::from_code("max-instructions"),
            PatternId::Custom("max-instructions".to_string())
        );
    }

    #[test]
    fn test_pattern_serializes_as_code() {
        let json = serde_json::to_string(&PatternId::MintKill).unwrap();
        assert_eq!(json, "\"P-101\"");
        let back: PatternId = serde_json::from_str("\"P-104\"").unwrap();
        assert_eq!(back, PatternId::DangerousClose);
    }

    #[test]
    fn test_emergency_verdict_carries_reason() {
        let result = ValidationResult::emergency_stop();
        assert!(!result.is_valid);
        assert!(result.is_emergency_stop());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("EMERGENCY STOP"));
    }

    #[test]
    fn test_validity_follows_blocking_set() {
        assert!(ValidationResult::new(Vec::new(), Vec::new()).is_valid);
        let blocked = ValidationResult::new(Vec::new(), vec![PatternId::FreezeKill]);
        assert!(!blocked.is_valid);
        assert_eq!(blocked.summary(), "blocked by P-102 (Freeze Kill)");
    }
}
