use super::resolver::ResolvedRule;
use crate::domain::{LedgerKey, RuleCategory, RuleId};

/// A rule that fired, with its unclamped accrual amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub rule_id: RuleId,
    pub category: RuleCategory,
    pub count: i64,
    pub amount: i64,
}

impl Candidate {
    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.rule_id, self.category)
    }
}

/// Multiply each fired rule's count by its per-unit amount.
///
/// Rules that did not fire (count <= 0) produce nothing.
pub fn accrue(resolved: &[ResolvedRule]) -> Vec<Candidate> {
    resolved
        .iter()
        .filter(|r| r.count > 0)
        .map(|r| Candidate {
            rule_id: r.rule.id,
            category: r.rule.category,
            count: r.count,
            amount: r.rule.amount_per_unit.saturating_mul(r.count),
        })
        .collect()
}
