//! Store abstraction over statistics, schedule, rule catalog and ledger.

use crate::domain::{
    Account, AccountCommit, AccountId, CommitResult, LedgerKey, PlayerStats, SavingsRule,
    ScheduleEntry, TeamStats, TransferInstruction,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

pub mod mock;

pub use mock::MockStore;

/// Everything the accrual engine reads and writes.
///
/// Statistic, schedule and rule reads are read-only during a run. Ledger and
/// transfer-instruction writes go through [`AccrualStore::commit_account_accrual`]
/// only, which must be atomic per account.
#[async_trait]
pub trait AccrualStore: Send + Sync {
    /// Team statistic counts recorded for `date`.
    async fn get_team_stats(&self, date: NaiveDate) -> Result<TeamStats, StoreError>;

    /// Player statistic counts recorded for `date`.
    async fn get_player_stats(&self, date: NaiveDate) -> Result<PlayerStats, StoreError>;

    /// Games scheduled in the `days` calendar days ending on `date` (inclusive),
    /// ordered by date then insertion order.
    async fn get_schedule_window(
        &self,
        date: NaiveDate,
        days: u32,
    ) -> Result<Vec<ScheduleEntry>, StoreError>;

    /// All accounts eligible for accrual, ascending.
    async fn list_account_ids(&self) -> Result<Vec<AccountId>, StoreError>;

    async fn get_account(&self, account_id: AccountId) -> Result<Account, StoreError>;

    /// Rules of an account in their persisted evaluation order.
    async fn get_account_rules(&self, account_id: AccountId)
        -> Result<Vec<SavingsRule>, StoreError>;

    /// Keys of ledger rows already written for (account, date).
    async fn get_existing_ledger_keys(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<HashSet<LedgerKey>, StoreError>;

    /// Sum of transfer instructions in `date`'s month on every day except `date`.
    ///
    /// Later days count too, so a backfilled date sees what was already
    /// committed after it.
    async fn get_month_transferred_excluding(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<i64, StoreError>;

    async fn get_transfer_instruction(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<Option<TransferInstruction>, StoreError>;

    /// Write all ledger rows of `commit` and add their total to the day's
    /// transfer instruction, in one transaction.
    ///
    /// Rows whose key already exists are left untouched and not counted.
    async fn commit_account_accrual(
        &self,
        commit: &AccountCommit,
    ) -> Result<CommitResult, StoreError>;
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::AccountNotFound(AccountId::new(9));
        assert_eq!(err.to_string(), "Account not found: 9");

        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Store unavailable: connection refused");

        let err = StoreError::Corrupt("bad date".to_string());
        assert_eq!(err.to_string(), "Corrupt stored value: bad date");
    }
}
