//! Ledger rows and transfer instructions produced by the accrual engine.

use crate::domain::{AccountId, RuleCategory, RuleId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Natural key of a ledger row within one (account, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub rule_id: RuleId,
    pub category: RuleCategory,
}

impl LedgerKey {
    pub fn new(rule_id: RuleId, category: RuleCategory) -> Self {
        Self { rule_id, category }
    }
}

/// One rule's accrual for one account on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub rule_category: RuleCategory,
    pub rule_id: RuleId,
    pub count: i64,
    pub amount: i64,
}

impl LedgerEntry {
    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.rule_id, self.rule_category)
    }
}

/// The single daily amount the transfer executor should move for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub amount: i64,
    pub memo: String,
}

/// Everything written for one account in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCommit {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub entries: Vec<LedgerEntry>,
    pub memo: String,
}

/// What a commit actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitResult {
    /// Ledger rows inserted (rows that already existed are not counted).
    pub entries_written: usize,
    /// Sum of the inserted rows' amounts, added to the day's instruction.
    pub amount_written: i64,
}
