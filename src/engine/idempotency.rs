use super::calculator::Candidate;
use crate::domain::LedgerKey;
use std::collections::HashSet;

/// Drops candidates whose ledger row was already written for (account, date).
#[derive(Debug, Clone, Default)]
pub struct IdempotencyGuard {
    recorded: HashSet<LedgerKey>,
}

impl IdempotencyGuard {
    pub fn new(recorded: HashSet<LedgerKey>) -> Self {
        Self { recorded }
    }

    /// Keep only unrecorded candidates, in order. Returns the kept list and
    /// the number skipped.
    pub fn admit(&mut self, candidates: Vec<Candidate>) -> (Vec<Candidate>, usize) {
        let total = candidates.len();
        let admitted: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| self.recorded.insert(c.key()))
            .collect();
        let skipped = total - admitted.len();
        (admitted, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RuleCategory, RuleId};

    fn candidate(id: i64, category: RuleCategory) -> Candidate {
        Candidate {
            rule_id: RuleId::new(id),
            category,
            count: 1,
            amount: 100,
        }
    }

    #[test]
    fn test_recorded_keys_are_skipped() {
        let recorded = HashSet::from([LedgerKey::new(RuleId::new(1), RuleCategory::Basic)]);
        let mut guard = IdempotencyGuard::new(recorded);

        let (admitted, skipped) = guard.admit(vec![
            candidate(1, RuleCategory::Basic),
            candidate(2, RuleCategory::Basic),
        ]);
        assert_eq!(skipped, 1);
        assert_eq!(admitted, vec![candidate(2, RuleCategory::Basic)]);
    }

    #[test]
    fn test_key_includes_category() {
        let recorded = HashSet::from([LedgerKey::new(RuleId::new(1), RuleCategory::Basic)]);
        let mut guard = IdempotencyGuard::new(recorded);

        let (admitted, skipped) = guard.admit(vec![candidate(1, RuleCategory::Opponent)]);
        assert_eq!(skipped, 0);
        assert_eq!(admitted.len(), 1);
    }

    #[test]
    fn test_duplicates_within_batch_admitted_once() {
        let mut guard = IdempotencyGuard::default();
        let (admitted, skipped) = guard.admit(vec![
            candidate(1, RuleCategory::Basic),
            candidate(1, RuleCategory::Basic),
        ]);
        assert_eq!(admitted.len(), 1);
        assert_eq!(skipped, 1);
    }
}
