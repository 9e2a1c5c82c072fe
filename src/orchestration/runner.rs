use crate::domain::{Account, AccountId, CommitResult, SavingsRule};
use crate::engine::{
    plan_account, AccountPlan, CommittedState, GameDay, GameStatsAggregator, LedgerWriter,
};
use crate::store::{AccrualStore, StoreError};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Accounts processed concurrently.
    pub worker_concurrency: usize,
    /// Upper bound for a whole run.
    pub run_timeout: Duration,
    pub transfer_memo: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            worker_concurrency: 4,
            run_timeout: Duration::from_secs(600),
            transfer_memo: "scheduled accrual transfer".to_string(),
        }
    }
}

/// Why one account was not (fully) processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Account or rule catalog could not be read; skipped for this run.
    Lookup,
    /// The ledger transaction failed; a re-run will retry it.
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAccount {
    pub account_id: AccountId,
    pub kind: FailureKind,
    pub reason: String,
}

/// Outcome of one `process_accrual_for_date` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub run_id: Uuid,
    pub date: NaiveDate,
    pub accounts_processed: usize,
    pub accounts_failed: Vec<FailedAccount>,
    /// Amount newly committed by this invocation.
    pub total_accrued: i64,
    pub entries_written: usize,
    pub entries_skipped_idempotent: usize,
    pub entries_clamped: usize,
    pub entries_dropped_by_limit: usize,
    pub rules_malformed: usize,
}

impl Summary {
    fn new(run_id: Uuid, date: NaiveDate) -> Self {
        Self {
            run_id,
            date,
            accounts_processed: 0,
            accounts_failed: Vec::new(),
            total_accrued: 0,
            entries_written: 0,
            entries_skipped_idempotent: 0,
            entries_clamped: 0,
            entries_dropped_by_limit: 0,
            rules_malformed: 0,
        }
    }

    pub fn has_write_failures(&self) -> bool {
        self.accounts_failed
            .iter()
            .any(|f| f.kind == FailureKind::Write)
    }

    fn record(&mut self, outcome: AccountOutcome) {
        self.accounts_processed += 1;
        self.total_accrued += outcome.amount_written;
        self.entries_written += outcome.entries_written;
        self.entries_skipped_idempotent += outcome.plan.skipped_idempotent;
        self.entries_clamped += outcome.plan.clamped;
        self.entries_dropped_by_limit += outcome.plan.dropped_by_limit;
        self.rules_malformed += outcome.plan.malformed;
    }
}

#[derive(Debug)]
struct AccountOutcome {
    plan: AccountPlan,
    entries_written: usize,
    amount_written: i64,
}

/// Per-account failure.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("lookup failed: {0}")]
    Lookup(#[source] StoreError),
    #[error("ledger write failed: {0}")]
    Write(#[source] StoreError),
}

/// Run-level failure.
#[derive(Debug, Error)]
pub enum AccrualError {
    #[error("statistics unavailable: {0}")]
    StatsUnavailable(#[source] StoreError),
    #[error("account list unavailable: {0}")]
    AccountsUnavailable(#[source] StoreError),
    #[error("ledger writes failed for some accounts on {}", .summary.date)]
    WriteFailures { summary: Box<Summary> },
    #[error("accrual run exceeded {0:?}")]
    DeadlineExceeded(Duration),
}

/// Runs the accrual pipeline for one calendar date over every account.
pub struct AccrualRunner {
    store: Arc<dyn AccrualStore>,
    settings: RunSettings,
    writer: LedgerWriter,
}

impl AccrualRunner {
    pub fn new(store: Arc<dyn AccrualStore>, settings: RunSettings) -> Self {
        let writer = LedgerWriter::new(settings.transfer_memo.clone());
        Self {
            store,
            settings,
            writer,
        }
    }

    /// Evaluate every account's rules for `date` and commit the results.
    ///
    /// Safe to call repeatedly for the same date: rows already in the ledger
    /// are never written or counted twice.
    ///
    /// # Errors
    /// Fails outright when statistics or the account list cannot be read, or
    /// the deadline passes. Accounts whose commit failed are reported through
    /// [`AccrualError::WriteFailures`] after the others have been processed;
    /// lookup failures are only recorded in the summary.
    pub async fn process_accrual_for_date(&self, date: NaiveDate) -> Result<Summary, AccrualError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("accrual_run", %run_id, %date);

        tokio::time::timeout(self.settings.run_timeout, self.run(run_id, date))
            .instrument(span)
            .await
            .map_err(|_| AccrualError::DeadlineExceeded(self.settings.run_timeout))?
    }

    async fn run(&self, run_id: Uuid, date: NaiveDate) -> Result<Summary, AccrualError> {
        let day = GameStatsAggregator::load(self.store.as_ref(), date)
            .await
            .map_err(AccrualError::StatsUnavailable)?;
        let account_ids = self
            .store
            .list_account_ids()
            .await
            .map_err(AccrualError::AccountsUnavailable)?;

        info!(accounts = account_ids.len(), "Starting accrual run");

        let day = &day;
        let results: Vec<(AccountId, Result<AccountOutcome, AccountError>)> =
            stream::iter(account_ids)
                .map(|account_id| async move {
                    (account_id, self.process_account(day, account_id).await)
                })
                .buffer_unordered(self.settings.worker_concurrency.max(1))
                .collect()
                .await;

        let mut summary = Summary::new(run_id, date);
        for (account_id, result) in results {
            match result {
                Ok(outcome) => summary.record(outcome),
                Err(err) => {
                    warn!(%account_id, error = %err, "Account accrual failed");
                    let kind = match err {
                        AccountError::Lookup(_) => FailureKind::Lookup,
                        AccountError::Write(_) => FailureKind::Write,
                    };
                    summary.accounts_failed.push(FailedAccount {
                        account_id,
                        kind,
                        reason: err.to_string(),
                    });
                }
            }
        }
        summary.accounts_failed.sort_by_key(|f| f.account_id);

        info!(
            accounts_processed = summary.accounts_processed,
            accounts_failed = summary.accounts_failed.len(),
            total_accrued = summary.total_accrued,
            entries_written = summary.entries_written,
            entries_skipped_idempotent = summary.entries_skipped_idempotent,
            "Accrual run finished"
        );

        if summary.has_write_failures() {
            return Err(AccrualError::WriteFailures {
                summary: Box::new(summary),
            });
        }
        Ok(summary)
    }

    async fn process_account(
        &self,
        day: &GameDay,
        account_id: AccountId,
    ) -> Result<AccountOutcome, AccountError> {
        let (account, rules, committed) = self
            .load_account(account_id, day.date)
            .await
            .map_err(AccountError::Lookup)?;

        let plan = plan_account(day, &account, &rules, committed);

        let commit = self.writer.build(account.id, day.date, plan.entries.clone());
        let CommitResult {
            entries_written,
            amount_written,
        } = self
            .writer
            .write(self.store.as_ref(), &commit)
            .await
            .map_err(AccountError::Write)?;

        tracing::debug!(
            %account_id,
            entries_written,
            amount_written,
            skipped_idempotent = plan.skipped_idempotent,
            "Account processed"
        );

        Ok(AccountOutcome {
            plan,
            entries_written,
            amount_written,
        })
    }

    async fn load_account(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<(Account, Vec<SavingsRule>, CommittedState), StoreError> {
        let account = self.store.get_account(account_id).await?;
        let mut rules = self.store.get_account_rules(account_id).await?;
        // not every store promises an order; clamping depends on it
        rules.sort_by_key(|r| r.order_key());

        let ledger_keys = self.store.get_existing_ledger_keys(account_id, date).await?;
        let daily_committed = self
            .store
            .get_transfer_instruction(account_id, date)
            .await?
            .map(|t| t.amount)
            .unwrap_or(0);
        let month_other_days = self
            .store
            .get_month_transferred_excluding(account_id, date)
            .await?;

        Ok((
            account,
            rules,
            CommittedState {
                ledger_keys,
                daily_committed,
                month_other_days,
            },
        ))
    }
}
