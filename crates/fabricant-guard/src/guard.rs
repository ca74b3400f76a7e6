//! Guard facade
//!
//! One `Guard` owns one configuration and one warning history. It is safe to
//! share behind an `Arc`; configuration updates are atomic with respect to
//! validations, which always run against a consistent snapshot.

use crate::config::{GuardConfig, GuardConfigUpdate};
use crate::detector::{PatternDetector, TokenProgramDetector};
use crate::error::GuardResult;
use crate::history::WarningHistory;
use crate::pattern::{SecurityWarning, ValidationResult};
use crate::policy;
use fabricant_core::Transaction;
use parking_lot::RwLock;
use std::sync::Arc;

/// Transaction guard
pub struct Guard {
    config: RwLock<GuardConfig>,
    history: WarningHistory,
    detectors: Vec<Arc<dyn PatternDetector>>,
}

impl Guard {
    /// Create a guard with the built-in token-program detector
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config: RwLock::new(config),
            history: WarningHistory::new(),
            detectors: vec![Arc::new(TokenProgramDetector)],
        }
    }

    /// Like [`Guard::new`], rejecting invalid configuration
    pub fn try_new(config: GuardConfig) -> GuardResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Register an additional detector; detectors run in registration order
    pub fn with_detector(mut self, detector: impl PatternDetector + 'static) -> Self {
        self.detectors.push(Arc::new(detector));
        self
    }

    /// Validate a transaction and record its warnings
    pub fn validate_transaction(&self, transaction: &Transaction) -> ValidationResult {
        // Rules run outside the lock so they may call back into the guard
        let config = self.config.read().clone();
        let detectors: Vec<&dyn PatternDetector> =
            self.detectors.iter().map(|d| d.as_ref()).collect();

        let result = policy::evaluate(transaction, &config, &detectors);
        self.history.record(&result.warnings);
        result
    }

    /// Validity of `transaction`, or of the guard itself when none is given
    pub fn validate(&self, transaction: Option<&Transaction>) -> bool {
        match transaction {
            Some(tx) => self.validate_transaction(tx).is_valid,
            None => !self.config.read().emergency_stop,
        }
    }

    /// Current configuration
    pub fn config(&self) -> GuardConfig {
        self.config.read().clone()
    }

    /// Merge a partial update. Invalid results are rejected and the previous
    /// configuration is kept.
    pub fn update_config(&self, update: GuardConfigUpdate) -> GuardResult<()> {
        let mut config = self.config.write();
        let mut next = config.clone();
        update.apply(&mut next);
        next.validate()?;
        *config = next;
        tracing::info!(
            mode = %config.mode,
            tolerance = %config.risk_tolerance,
            "guard configuration updated"
        );
        Ok(())
    }

    pub fn activate_emergency_stop(&self) {
        self.config.write().emergency_stop = true;
        tracing::warn!("emergency stop activated; all transactions will be blocked");
    }

    pub fn deactivate_emergency_stop(&self) {
        self.config.write().emergency_stop = false;
        tracing::warn!("emergency stop deactivated");
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.config.read().emergency_stop
    }

    pub fn warning_history(&self) -> Vec<SecurityWarning> {
        self.history.snapshot()
    }

    pub fn clear_warning_history(&self) {
        self.history.clear();
    }

    pub fn history(&self) -> &WarningHistory {
        &self.history
    }

    /// `actual <= max_slippage`, or `true` when no limit is configured
    pub fn is_slippage_acceptable(&self, actual: f64) -> bool {
        match self.config.read().max_slippage {
            Some(max) => actual <= max,
            None => true,
        }
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("config", &*self.config.read())
            .field("history", &self.history.len())
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
