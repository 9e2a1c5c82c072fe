use crate::domain::{AccountCommit, AccountId, CommitResult, LedgerEntry};
use crate::store::{AccrualStore, StoreError};
use chrono::NaiveDate;

/// Persists an account's accepted ledger rows and its transfer instruction.
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    memo: String,
}

impl LedgerWriter {
    pub fn new(memo: impl Into<String>) -> Self {
        Self { memo: memo.into() }
    }

    /// Bundle accepted entries into one commit.
    ///
    /// An empty commit still records the day's transfer instruction.
    pub fn build(
        &self,
        account_id: AccountId,
        date: NaiveDate,
        entries: Vec<LedgerEntry>,
    ) -> AccountCommit {
        AccountCommit {
            account_id,
            date,
            entries,
            memo: self.memo.clone(),
        }
    }

    /// Write the commit atomically. The account's running balance is not touched.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; nothing is persisted then.
    pub async fn write(
        &self,
        store: &dyn AccrualStore,
        commit: &AccountCommit,
    ) -> Result<CommitResult, StoreError> {
        let result = store.commit_account_accrual(commit).await?;
        if result.entries_written < commit.entries.len() {
            tracing::warn!(
                account_id = %commit.account_id,
                date = %commit.date,
                offered = commit.entries.len(),
                written = result.entries_written,
                "Some ledger rows already existed at commit time"
            );
        }
        Ok(result)
    }
}
