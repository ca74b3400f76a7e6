//! Warning history
//!
//! Observational only: nothing here feeds back into blocking decisions.

use crate::pattern::{PatternId, SecurityWarning};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Append-only record of every warning a guard produced
#[derive(Debug, Default)]
pub struct WarningHistory {
    entries: RwLock<Vec<SecurityWarning>>,
}

impl WarningHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, warnings: &[SecurityWarning]) {
        if warnings.is_empty() {
            return;
        }
        self.entries.write().extend_from_slice(warnings);
    }

    /// Copy of every recorded warning, oldest first
    pub fn snapshot(&self) -> Vec<SecurityWarning> {
        self.entries.read().clone()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of warnings per pattern
    pub fn counts_by_pattern(&self) -> BTreeMap<PatternId, usize> {
        let mut counts = BTreeMap::new();
        for warning in self.entries.read().iter() {
            *counts.entry(warning.pattern_id.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Severity;

    #[test]
    fn test_record_and_clear() {
        let history = WarningHistory::new();
        history.record(&[
            SecurityWarning::new(PatternId::DangerousClose, Severity::Alert, "a"),
            SecurityWarning::new(PatternId::DangerousClose, Severity::Alert, "b"),
            SecurityWarning::new(PatternId::MintKill, Severity::Critical, "c"),
        ]);

        assert_eq!(history.len(), 3);
        assert_eq!(history.snapshot()[2].message, "c");

        let counts = history.counts_by_pattern();
        assert_eq!(counts[&PatternId::DangerousClose], 2);
        assert_eq!(counts[&PatternId::MintKill], 1);

        history.clear();
        assert!(history.is_empty());
    }
}
