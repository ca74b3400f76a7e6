//! Guard configuration and partial updates

use crate::pattern::PatternId;
use crate::rules::CustomRule;
use fabricant_core::{CoreError, Result};
use fabricant_pulsar::RiskOracleConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which severities turn into a block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Strict,
    #[default]
    Moderate,
    Permissive,
}

/// Enforcing or advisory operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Block,
    Warn,
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTolerance::Strict => write!(f, "strict"),
            RiskTolerance::Moderate => write!(f, "moderate"),
            RiskTolerance::Permissive => write!(f, "permissive"),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Block => write!(f, "block"),
            Mode::Warn => write!(f, "warn"),
        }
    }
}

/// Guard configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Largest acceptable slippage; `None` accepts anything
    pub max_slippage: Option<f64>,

    /// Halt every validation
    pub emergency_stop: bool,

    pub enable_pattern_detection: bool,

    pub risk_tolerance: RiskTolerance,

    pub mode: Mode,

    /// Evaluated in order after pattern detection
    #[serde(skip)]
    pub custom_rules: Vec<CustomRule>,

    /// Risk oracle settings; absent means no risk gating
    pub risk: Option<RiskOracleConfig>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_slippage: None,
            emergency_stop: false,
            enable_pattern_detection: true,
            risk_tolerance: RiskTolerance::Moderate,
            mode: Mode::Block,
            custom_rules: Vec::new(),
            risk: None,
        }
    }
}

impl GuardConfig {
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_risk_tolerance(mut self, tolerance: RiskTolerance) -> Self {
        self.risk_tolerance = tolerance;
        self
    }

    pub fn with_rule(mut self, rule: CustomRule) -> Self {
        self.custom_rules.push(rule);
        self
    }

    pub fn with_risk(mut self, risk: RiskOracleConfig) -> Self {
        self.risk = Some(risk);
        self
    }

    /// Risk config, only when present and enabled
    pub fn active_risk(&self) -> Option<&RiskOracleConfig> {
        self.risk.as_ref().filter(|r| r.enabled)
    }

    /// Reject values outside their domain
    pub fn validate(&self) -> Result<()> {
        if let Some(slippage) = self.max_slippage {
            if !slippage.is_finite() || slippage < 0.0 {
                return Err(CoreError::invalid_config(
                    "max_slippage",
                    format!("must be a non-negative number, got {}", slippage),
                ));
            }
        }

        if let Some(risk) = &self.risk {
            if let Some(threshold) = risk.risk_threshold {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(CoreError::invalid_config(
                        "risk.risk_threshold",
                        format!("must be within 0.0..=1.0, got {}", threshold),
                    ));
                }
            }
            if risk.max_attempts == 0 {
                return Err(CoreError::invalid_config(
                    "risk.max_attempts",
                    "must be at least 1",
                ));
            }
            if risk.timeout_ms == 0 {
                return Err(CoreError::invalid_config(
                    "risk.timeout_ms",
                    "must be at least 1",
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for rule in &self.custom_rules {
            // Built-in codes would read back as the built-in pattern
            if !matches!(PatternId::from_code(&rule.id), PatternId::Custom(_)) {
                return Err(CoreError::invalid_config(
                    "custom_rules",
                    format!("rule id `{}` is a reserved pattern code", rule.id),
                ));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(CoreError::invalid_config(
                    "custom_rules",
                    format!("duplicate rule id `{}`", rule.id),
                ));
            }
        }

        Ok(())
    }
}

/// Partial configuration update.
///
/// `None` keeps the current value. `max_slippage` and `risk` are tri-state:
/// `Some(None)` clears them.
#[derive(Clone, Debug, Default)]
pub struct GuardConfigUpdate {
    pub max_slippage: Option<Option<f64>>,
    pub emergency_stop: Option<bool>,
    pub enable_pattern_detection: Option<bool>,
    pub risk_tolerance: Option<RiskTolerance>,
    pub mode: Option<Mode>,
    pub custom_rules: Option<Vec<CustomRule>>,
    pub risk: Option<Option<RiskOracleConfig>>,
}

impl GuardConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_slippage(mut self, value: Option<f64>) -> Self {
        self.max_slippage = Some(value);
        self
    }

    pub fn emergency_stop(mut self, value: bool) -> Self {
        self.emergency_stop = Some(value);
        self
    }

    pub fn enable_pattern_detection(mut self, value: bool) -> Self {
        self.enable_pattern_detection = Some(value);
        self
    }

    pub fn risk_tolerance(mut self, value: RiskTolerance) -> Self {
        self.risk_tolerance = Some(value);
        self
    }

    pub fn mode(mut self, value: Mode) -> Self {
        self.mode = Some(value);
        self
    }

    pub fn custom_rules(mut self, rules: Vec<CustomRule>) -> Self {
        self.custom_rules = Some(rules);
        self
    }

    pub fn risk(mut self, value: Option<RiskOracleConfig>) -> Self {
        self.risk = Some(value);
        self
    }

    /// Merge onto `config`, keeping every unspecified field
    pub fn apply(self, config: &mut GuardConfig) {
        if let Some(v) = self.max_slippage {
            config.max_slippage = v;
        }
        if let Some(v) = self.emergency_stop {
            config.emergency_stop = v;
        }
        if let Some(v) = self.enable_pattern_detection {
            config.enable_pattern_detection = v;
        }
        if let Some(v) = self.risk_tolerance {
            config.risk_tolerance = v;
        }
        if let Some(v) = self.mode {
            config.mode = v;
        }
        if let Some(v) = self.custom_rules {
            config.custom_rules = v;
        }
        if let Some(v) = self.risk {
            config.risk = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert!(config.enable_pattern_detection);
        assert!(!config.emergency_stop);
        assert_eq!(config.risk_tolerance, RiskTolerance::Moderate);
        assert_eq!(config.mode, Mode::Block);
        assert!(config.max_slippage.is_none());
        assert!(config.risk.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: GuardConfig = toml::from_str(
            r#"
            mode = "warn"
            max_slippage = 0.05

            [risk]
            enabled = true
            risk_threshold = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, Mode::Warn);
        assert_eq!(config.risk_tolerance, RiskTolerance::Moderate);
        assert_eq!(config.max_slippage, Some(0.05));
        let risk = config.active_risk().unwrap();
        assert_eq!(risk.risk_threshold, Some(0.8));
        assert_eq!(risk.cache_ttl_ms, 60_000);
    }

    #[test]
    fn test_update_keeps_unspecified_fields() {
        let mut config = GuardConfig {
            max_slippage: Some(0.01),
            ..GuardConfig::default()
        }
        .with_risk_tolerance(RiskTolerance::Strict);

        GuardConfigUpdate::new().mode(Mode::Warn).apply(&mut config);

        assert_eq!(config.mode, Mode::Warn);
        assert_eq!(config.risk_tolerance, RiskTolerance::Strict);
        assert_eq!(config.max_slippage, Some(0.01));
    }

    #[test]
    fn test_update_can_clear_optional_fields() {
        let mut config = GuardConfig {
            max_slippage: Some(0.01),
            ..GuardConfig::default()
        }
        .with_risk(RiskOracleConfig::with_threshold(0.5));

        GuardConfigUpdate::new()
            .max_slippage(None)
            .risk(None)
            .apply(&mut config);

        assert!(config.max_slippage.is_none());
        assert!(config.risk.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_slippage = GuardConfig {
            max_slippage: Some(-1.0),
            ..GuardConfig::default()
        };
        assert!(matches!(
            bad_slippage.validate(),
            Err(CoreError::InvalidConfig { ref field, .. }) if field == "max_slippage"
        ));

        let bad_threshold = GuardConfig::default().with_risk(RiskOracleConfig::with_threshold(1.5));
        assert!(bad_threshold.validate().is_err());

        let duplicate = GuardConfig::default()
            .with_rule(CustomRule::new("r", "one", |_| Ok(true)))
            .with_rule(CustomRule::new("r", "two", |_| Ok(true)));
        assert!(duplicate.validate().is_err());

        assert!(GuardConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = GuardConfig::default().with_risk(RiskOracleConfig {
            timeout_ms: 0,
            ..RiskOracleConfig::with_threshold(0.5)
        });
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { ref field, .. }) if field == "risk.timeout_ms"
        ));
    }

    #[test]
    fn test_validate_rejects_reserved_rule_ids() {
        for code in ["P-000", "P-101", "P-102", "P-103", "P-104"] {
            let config =
                GuardConfig::default().with_rule(CustomRule::new(code, "shadow", |_| Ok(true)));
            assert!(
                matches!(
                    config.validate(),
                    Err(CoreError::InvalidConfig { ref field, .. }) if field == "custom_rules"
                ),
                "{} accepted",
                code
            );
        }

        let custom = GuardConfig::default().with_rule(CustomRule::new("P-105", "ok", |_| Ok(true)));
        assert!(custom.validate().is_ok());
    }
}
