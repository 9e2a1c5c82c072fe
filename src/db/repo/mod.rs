//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `catalog.rs` - Accounts, players and savings rules
//! - `stats.rs` - Box-score statistics and the schedule
//! - `ledger.rs` - Ledger entries and transfer instructions
//!
//! `Repository` is the SQLite implementation of [`AccrualStore`].

mod catalog;
mod ledger;
mod stats;

use crate::domain::{
    Account, AccountCommit, AccountId, CommitResult, LedgerKey, PlayerStats, SavingsRule,
    ScheduleEntry, TeamStats, TransferInstruction,
};
use crate::store::{AccrualStore, StoreError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Cheap connectivity check.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn date_from_sql(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("date {:?}: {}", raw, e)))
}

#[async_trait]
impl AccrualStore for Repository {
    async fn get_team_stats(&self, date: NaiveDate) -> Result<TeamStats, StoreError> {
        Ok(self.query_team_stats(date).await?)
    }

    async fn get_player_stats(&self, date: NaiveDate) -> Result<PlayerStats, StoreError> {
        Ok(self.query_player_stats(date).await?)
    }

    async fn get_schedule_window(
        &self,
        date: NaiveDate,
        days: u32,
    ) -> Result<Vec<ScheduleEntry>, StoreError> {
        self.query_schedule_window(date, days).await
    }

    async fn list_account_ids(&self) -> Result<Vec<AccountId>, StoreError> {
        Ok(self.query_account_ids().await?)
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Account, StoreError> {
        self.query_account(account_id)
            .await?
            .ok_or(StoreError::AccountNotFound(account_id))
    }

    async fn get_account_rules(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<SavingsRule>, StoreError> {
        self.query_account_rules(account_id).await
    }

    async fn get_existing_ledger_keys(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<HashSet<LedgerKey>, StoreError> {
        self.query_ledger_keys(account_id, date).await
    }

    async fn get_month_transferred_excluding(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<i64, StoreError> {
        Ok(self.sum_month_transfers_excluding(account_id, date).await?)
    }

    async fn get_transfer_instruction(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<Option<TransferInstruction>, StoreError> {
        self.query_transfer_instruction(account_id, date).await
    }

    async fn commit_account_accrual(
        &self,
        commit: &AccountCommit,
    ) -> Result<CommitResult, StoreError> {
        Ok(self.commit_accrual_atomic(commit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 9).unwrap();
        assert_eq!(date_to_sql(date), "2024-04-09");
        assert_eq!(date_from_sql("2024-04-09").unwrap(), date);
    }

    #[test]
    fn test_bad_date_is_corrupt() {
        assert!(matches!(
            date_from_sql("04/09/2024"),
            Err(StoreError::Corrupt(_))
        ));
    }
}
