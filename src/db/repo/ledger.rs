//! Ledger entry and transfer instruction operations for the repository.

use crate::domain::{
    AccountCommit, AccountId, CommitResult, LedgerEntry, LedgerKey, RuleCategory, RuleId,
    TransferInstruction,
};
use crate::store::StoreError;
use chrono::{Datelike, Months, NaiveDate};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashSet;

use super::{date_from_sql, date_to_sql, Repository};

/// First day of `date`'s month.
fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after `date`'s month.
fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}

fn ledger_entry_from_row(row: &SqliteRow) -> Result<LedgerEntry, StoreError> {
    let category_str: String = row.try_get("rule_category")?;
    Ok(LedgerEntry {
        account_id: AccountId::new(row.try_get("account_id")?),
        date: date_from_sql(&row.try_get::<String, _>("game_date")?)?,
        rule_category: category_str
            .parse::<RuleCategory>()
            .map_err(StoreError::Corrupt)?,
        rule_id: RuleId::new(row.try_get("rule_id")?),
        count: row.try_get("count")?,
        amount: row.try_get("amount")?,
    })
}

fn transfer_from_row(row: &SqliteRow) -> Result<TransferInstruction, StoreError> {
    Ok(TransferInstruction {
        account_id: AccountId::new(row.try_get("account_id")?),
        date: date_from_sql(&row.try_get::<String, _>("game_date")?)?,
        amount: row.try_get("amount")?,
        memo: row.try_get("memo")?,
    })
}

impl Repository {
    // =========================================================================
    // Ledger entries
    // =========================================================================

    pub(super) async fn query_ledger_keys(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<HashSet<LedgerKey>, StoreError> {
        let rows = sqlx::query(
            "SELECT rule_id, rule_category FROM ledger_entries WHERE account_id = ? AND game_date = ?",
        )
        .bind(account_id.as_i64())
        .bind(date_to_sql(date))
        .fetch_all(&self.pool)
        .await?;

        let mut keys = HashSet::with_capacity(rows.len());
        for row in rows {
            let category_str: String = row.try_get("rule_category")?;
            let category = category_str
                .parse::<RuleCategory>()
                .map_err(StoreError::Corrupt)?;
            keys.insert(LedgerKey::new(RuleId::new(row.try_get("rule_id")?), category));
        }
        Ok(keys)
    }

    /// Ledger rows for an account, optionally restricted to one date.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row cannot be decoded.
    pub async fn query_ledger_entries(
        &self,
        account_id: AccountId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = match date {
            Some(date) => {
                sqlx::query(
                    r#"
                    SELECT account_id, game_date, rule_category, rule_id, count, amount
                    FROM ledger_entries
                    WHERE account_id = ? AND game_date = ?
                    ORDER BY id ASC
                    "#,
                )
                .bind(account_id.as_i64())
                .bind(date_to_sql(date))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT account_id, game_date, rule_category, rule_id, count, amount
                    FROM ledger_entries
                    WHERE account_id = ?
                    ORDER BY game_date ASC, id ASC
                    "#,
                )
                .bind(account_id.as_i64())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(ledger_entry_from_row).collect()
    }

    // =========================================================================
    // Transfer instructions
    // =========================================================================

    /// Month total of transfer instructions on every day except `date`.
    pub(super) async fn sum_month_transfers_excluding(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS total
            FROM transfer_instructions
            WHERE account_id = ? AND game_date >= ? AND game_date < ? AND game_date <> ?
            "#,
        )
        .bind(account_id.as_i64())
        .bind(date_to_sql(month_start(date)))
        .bind(date_to_sql(next_month_start(date)))
        .bind(date_to_sql(date))
        .fetch_one(&self.pool)
        .await?;

        row.try_get("total")
    }

    pub(super) async fn query_transfer_instruction(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<Option<TransferInstruction>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT account_id, game_date, amount, memo
            FROM transfer_instructions
            WHERE account_id = ? AND game_date = ?
            "#,
        )
        .bind(account_id.as_i64())
        .bind(date_to_sql(date))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(transfer_from_row).transpose()
    }

    /// Transfer instructions of an account for the month containing `month_of`.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row cannot be decoded.
    pub async fn query_transfer_instructions(
        &self,
        account_id: AccountId,
        month_of: NaiveDate,
    ) -> Result<Vec<TransferInstruction>, StoreError> {
        let start = month_start(month_of);
        let end = next_month_start(month_of);

        let rows = sqlx::query(
            r#"
            SELECT account_id, game_date, amount, memo
            FROM transfer_instructions
            WHERE account_id = ? AND game_date >= ? AND game_date < ?
            ORDER BY game_date ASC
            "#,
        )
        .bind(account_id.as_i64())
        .bind(date_to_sql(start))
        .bind(date_to_sql(end))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transfer_from_row).collect()
    }

    // =========================================================================
    // Atomic per-account commit
    // =========================================================================

    /// Insert ledger rows and add their total to the day's transfer instruction
    /// in a single transaction.
    ///
    /// Rows that already exist are skipped by the unique key and do not count
    /// toward the instruction, so a commit replayed after a crash is a no-op.
    /// The instruction row is always present afterwards, with amount 0 when
    /// nothing has been accepted for the day.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; nothing is persisted then.
    pub async fn commit_accrual_atomic(
        &self,
        commit: &AccountCommit,
    ) -> Result<CommitResult, sqlx::Error> {
        let mut result = CommitResult::default();
        let date = date_to_sql(commit.date);
        let mut tx = self.pool.begin().await?;

        for entry in &commit.entries {
            let inserted = sqlx::query(
                r#"
                INSERT INTO ledger_entries (account_id, game_date, rule_category, rule_id, count, amount)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(account_id, game_date, rule_id, rule_category) DO NOTHING
                "#,
            )
            .bind(commit.account_id.as_i64())
            .bind(date.as_str())
            .bind(entry.rule_category.as_str())
            .bind(entry.rule_id.as_i64())
            .bind(entry.count)
            .bind(entry.amount)
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() > 0 {
                result.entries_written += 1;
                result.amount_written += entry.amount;
            }
        }

        sqlx::query(
            r#"
            INSERT INTO transfer_instructions (account_id, game_date, amount, memo)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(account_id, game_date) DO UPDATE SET
                amount = transfer_instructions.amount + excluded.amount
            "#,
        )
        .bind(commit.account_id.as_i64())
        .bind(date.as_str())
        .bind(result.amount_written)
        .bind(commit.memo.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_next_month_start_rolls_year() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(
            next_month_start(date),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }
}
