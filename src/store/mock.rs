//! In-memory store for testing without a database.

use super::{AccrualStore, StoreError};
use crate::domain::{
    Account, AccountCommit, AccountId, CommitResult, LedgerEntry, LedgerKey, PlayerId,
    PlayerStats, SavingsRule, ScheduleEntry, StatKind, TeamId, TeamStats, TransferInstruction,
};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct MockState {
    accounts: BTreeMap<AccountId, Account>,
    rules: Vec<SavingsRule>,
    team_stats: HashMap<NaiveDate, TeamStats>,
    player_stats: HashMap<NaiveDate, PlayerStats>,
    schedule: Vec<ScheduleEntry>,
    ledger: Vec<LedgerEntry>,
    transfers: BTreeMap<(AccountId, NaiveDate), TransferInstruction>,
}

/// Mock store that keeps everything in memory and can inject failures.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
    stats_unavailable: AtomicUsize,
    failing_commits: AtomicUsize,
    rules_unavailable_for: HashSet<AccountId>,
    commit_attempts: AtomicUsize,
}

impl MockStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: Account) -> Self {
        self.lock().accounts.insert(account.id, account);
        self
    }

    pub fn with_rule(self, rule: SavingsRule) -> Self {
        self.lock().rules.push(rule);
        self
    }

    pub fn with_team_stat(self, date: NaiveDate, team: TeamId, kind: &str, count: i64) -> Self {
        self.lock()
            .team_stats
            .entry(date)
            .or_default()
            .entry(team)
            .or_default()
            .insert(StatKind::from(kind), count);
        self
    }

    pub fn with_player_stat(
        self,
        date: NaiveDate,
        player: PlayerId,
        kind: &str,
        count: i64,
    ) -> Self {
        self.lock()
            .player_stats
            .entry(date)
            .or_default()
            .entry(player)
            .or_default()
            .insert(StatKind::from(kind), count);
        self
    }

    pub fn with_game(self, game: ScheduleEntry) -> Self {
        self.lock().schedule.push(game);
        self
    }

    /// Pre-existing transfer instruction, e.g. from earlier days of the month.
    pub fn with_transfer(self, transfer: TransferInstruction) -> Self {
        self.lock()
            .transfers
            .insert((transfer.account_id, transfer.date), transfer);
        self
    }

    /// Fail the next `times` statistic reads.
    pub fn with_stats_unavailable(self, times: usize) -> Self {
        self.stats_unavailable.store(times, Ordering::SeqCst);
        self
    }

    /// Fail every rule catalog lookup for `account_id`.
    pub fn with_rules_unavailable(mut self, account_id: AccountId) -> Self {
        self.rules_unavailable_for.insert(account_id);
        self
    }

    /// Fail the next `times` commits.
    pub fn with_failing_commits(self, times: usize) -> Self {
        self.failing_commits.store(times, Ordering::SeqCst);
        self
    }

    /// All ledger rows written so far, in write order.
    pub fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.lock().ledger.clone()
    }

    /// All transfer instructions, ordered by (account, date).
    pub fn transfer_instructions(&self) -> Vec<TransferInstruction> {
        self.lock().transfers.values().cloned().collect()
    }

    /// Number of commit calls, including failed ones.
    pub fn commit_attempts(&self) -> usize {
        self.commit_attempts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl AccrualStore for MockStore {
    async fn get_team_stats(&self, date: NaiveDate) -> Result<TeamStats, StoreError> {
        if Self::take_failure(&self.stats_unavailable) {
            return Err(StoreError::Unavailable("statistics store offline".to_string()));
        }
        Ok(self.lock().team_stats.get(&date).cloned().unwrap_or_default())
    }

    async fn get_player_stats(&self, date: NaiveDate) -> Result<PlayerStats, StoreError> {
        Ok(self
            .lock()
            .player_stats
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_schedule_window(
        &self,
        date: NaiveDate,
        days: u32,
    ) -> Result<Vec<ScheduleEntry>, StoreError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let start = date - Duration::days(i64::from(days) - 1);
        let mut games: Vec<ScheduleEntry> = self
            .lock()
            .schedule
            .iter()
            .filter(|g| g.date >= start && g.date <= date)
            .cloned()
            .collect();
        games.sort_by_key(|g| g.date);
        Ok(games)
    }

    async fn list_account_ids(&self) -> Result<Vec<AccountId>, StoreError> {
        Ok(self.lock().accounts.keys().copied().collect())
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Account, StoreError> {
        self.lock()
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(StoreError::AccountNotFound(account_id))
    }

    async fn get_account_rules(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<SavingsRule>, StoreError> {
        if self.rules_unavailable_for.contains(&account_id) {
            return Err(StoreError::Unavailable(format!(
                "rule catalog unavailable for account {}",
                account_id
            )));
        }
        let mut rules: Vec<SavingsRule> = self
            .lock()
            .rules
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.order_key());
        Ok(rules)
    }

    async fn get_existing_ledger_keys(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<HashSet<LedgerKey>, StoreError> {
        Ok(self
            .lock()
            .ledger
            .iter()
            .filter(|e| e.account_id == account_id && e.date == date)
            .map(LedgerEntry::key)
            .collect())
    }

    async fn get_month_transferred_excluding(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<i64, StoreError> {
        Ok(self
            .lock()
            .transfers
            .values()
            .filter(|t| {
                t.account_id == account_id
                    && t.date != date
                    && t.date.year() == date.year()
                    && t.date.month() == date.month()
            })
            .map(|t| t.amount)
            .sum())
    }

    async fn get_transfer_instruction(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<Option<TransferInstruction>, StoreError> {
        Ok(self.lock().transfers.get(&(account_id, date)).cloned())
    }

    async fn commit_account_accrual(
        &self,
        commit: &AccountCommit,
    ) -> Result<CommitResult, StoreError> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.failing_commits) {
            return Err(StoreError::Unavailable("ledger write failed".to_string()));
        }

        // The lock spans the whole commit, so it is all-or-nothing.
        let mut state = self.lock();
        let existing: HashSet<LedgerKey> = state
            .ledger
            .iter()
            .filter(|e| e.account_id == commit.account_id && e.date == commit.date)
            .map(LedgerEntry::key)
            .collect();

        let mut result = CommitResult::default();
        for entry in &commit.entries {
            if existing.contains(&entry.key()) {
                continue;
            }
            state.ledger.push(entry.clone());
            result.entries_written += 1;
            result.amount_written += entry.amount;
        }

        state
            .transfers
            .entry((commit.account_id, commit.date))
            .and_modify(|t| t.amount += result.amount_written)
            .or_insert_with(|| TransferInstruction {
                account_id: commit.account_id,
                date: commit.date,
                amount: result.amount_written,
                memo: commit.memo.clone(),
            });

        Ok(result)
    }
}
