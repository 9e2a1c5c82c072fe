//! Pure computation stages of the savings accrual pipeline.
//!
//! Aggregator -> Resolver -> Calculator -> Idempotency guard -> Limit enforcer
//! -> Ledger writer. Only the aggregator and the writer touch the store.

use crate::domain::{Account, LedgerEntry, LedgerKey, SavingsRule};
use std::collections::HashSet;

pub mod aggregator;
pub mod calculator;
pub mod idempotency;
pub mod ledger_writer;
pub mod limits;
pub mod resolver;

pub use aggregator::{GameDay, GameStatsAggregator, TeamGame, SWEEP_WINDOW_DAYS};
pub use calculator::{accrue, Candidate};
pub use idempotency::IdempotencyGuard;
pub use ledger_writer::LedgerWriter;
pub use limits::{LimitDecision, LimitEnforcer};
pub use resolver::{resolve_rules, sweep_count, ResolvedRule, Resolution};

/// Previously committed state of an account for the target date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommittedState {
    pub ledger_keys: HashSet<LedgerKey>,
    /// Today's transfer instruction amount, 0 on a fresh run.
    pub daily_committed: i64,
    /// Month total of every other day, earlier or later.
    pub month_other_days: i64,
}

/// Ledger rows to write for one account, with per-stage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPlan {
    pub entries: Vec<LedgerEntry>,
    pub skipped_idempotent: usize,
    pub clamped: usize,
    pub dropped_by_limit: usize,
    pub malformed: usize,
}

impl AccountPlan {
    pub fn total(&self) -> i64 {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

/// Run every pure stage for one account.
///
/// `rules` must already be in evaluation order.
pub fn plan_account(
    day: &GameDay,
    account: &Account,
    rules: &[SavingsRule],
    committed: CommittedState,
) -> AccountPlan {
    let resolution = resolve_rules(day, account, rules);
    let candidates = accrue(&resolution.resolved);

    let mut guard = IdempotencyGuard::new(committed.ledger_keys);
    let (admitted, skipped_idempotent) = guard.admit(candidates);

    let mut enforcer = LimitEnforcer::new(
        account.daily_limit,
        account.month_limit,
        committed.daily_committed,
        committed.month_other_days,
    );

    let mut plan = AccountPlan {
        skipped_idempotent,
        malformed: resolution.malformed.len(),
        ..AccountPlan::default()
    };

    for candidate in admitted {
        match enforcer.apply(candidate.amount) {
            LimitDecision::Accepted { amount, clamped } => {
                if clamped {
                    tracing::debug!(
                        account_id = %account.id,
                        rule_id = %candidate.rule_id,
                        requested = candidate.amount,
                        accepted = amount,
                        "Accrual clamped by transfer limit"
                    );
                    plan.clamped += 1;
                }
                plan.entries.push(LedgerEntry {
                    account_id: account.id,
                    date: day.date,
                    rule_category: candidate.category,
                    rule_id: candidate.rule_id,
                    count: candidate.count,
                    amount,
                });
            }
            LimitDecision::Exhausted => {
                tracing::info!(
                    account_id = %account.id,
                    rule_id = %candidate.rule_id,
                    requested = candidate.amount,
                    daily_accumulated = enforcer.daily_accumulated(),
                    monthly_accumulated = enforcer.monthly_accumulated(),
                    "Transfer limit reached, accrual skipped"
                );
                plan.dropped_by_limit += 1;
            }
        }
    }

    plan
}
