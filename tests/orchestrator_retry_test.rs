//! Scheduler and retry behaviour with an in-memory store and a manual clock.

use async_trait::async_trait;
use ballpark_savings::domain::{Account, AccountId, RuleCategory, RuleId, SavingsRule, StatKind, TeamId};
use ballpark_savings::orchestration::{
    AccrualError, AccrualRunner, Clock, OrchestrationError, Orchestrator, RetryPolicy, RunSettings,
};
use ballpark_savings::store::MockStore;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Clock that never waits; it advances its own time and records each sleep.
struct ManualClock {
    now: Mutex<NaiveDateTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let step = chrono::Duration::from_std(duration).unwrap();
        *self.now.lock().unwrap() += step;
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn store() -> MockStore {
    MockStore::new()
        .with_account(Account::new(AccountId::new(1), TeamId::new(1), 1000, 10_000))
        .with_rule(SavingsRule {
            id: RuleId::new(1),
            account_id: AccountId::new(1),
            ordinal: 0,
            category: RuleCategory::Basic,
            stat_kind: StatKind::from("win"),
            bound_player: None,
            amount_per_unit: 400,
        })
        .with_team_stat(day(12), TeamId::new(1), "win", 1)
}

fn orchestrator(
    store: Arc<MockStore>,
    clock: Arc<ManualClock>,
    policy: RetryPolicy,
) -> Orchestrator {
    let runner = Arc::new(AccrualRunner::new(store, RunSettings::default()));
    Orchestrator::new(
        runner,
        clock,
        policy,
        NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
    )
}

#[tokio::test]
async fn stats_outage_is_retried_until_success() {
    let store = Arc::new(store().with_stats_unavailable(2));
    let clock = Arc::new(ManualClock::at(day(12).and_hms_opt(23, 30, 0).unwrap()));
    let orch = orchestrator(
        store.clone(),
        clock.clone(),
        RetryPolicy::fixed(3, Duration::from_secs(60)),
    );

    let summary = orch.run_with_retry(day(12)).await.unwrap();

    assert_eq!(summary.total_accrued, 400);
    let waits: Vec<u64> = clock.sleeps().iter().map(|d| d.as_secs()).collect();
    assert_eq!(waits, vec![60, 60]);
    assert_eq!(store.ledger_entries().len(), 1);
}

#[tokio::test]
async fn failed_write_is_retried_without_double_counting() {
    let store = Arc::new(
        store()
            .with_account(Account::new(AccountId::new(2), TeamId::new(1), 1000, 10_000))
            .with_rule(SavingsRule {
                id: RuleId::new(2),
                account_id: AccountId::new(2),
                ordinal: 0,
                category: RuleCategory::Basic,
                stat_kind: StatKind::from("win"),
                bound_player: None,
                amount_per_unit: 250,
            })
            .with_failing_commits(1),
    );
    let clock = Arc::new(ManualClock::at(day(12).and_hms_opt(23, 30, 0).unwrap()));
    let orch = orchestrator(
        store.clone(),
        clock.clone(),
        RetryPolicy::fixed(3, Duration::from_secs(60)),
    );

    orch.run_with_retry(day(12)).await.unwrap();

    assert_eq!(clock.sleeps().len(), 1);
    assert_eq!(store.ledger_entries().len(), 2);
    let transferred: i64 = store.transfer_instructions().iter().map(|t| t.amount).sum();
    assert_eq!(transferred, 650);
}

#[tokio::test]
async fn retries_are_bounded() {
    let store = Arc::new(store().with_stats_unavailable(usize::MAX));
    let clock = Arc::new(ManualClock::at(day(12).and_hms_opt(23, 30, 0).unwrap()));
    let policy = RetryPolicy {
        max_retries: 2,
        delay: Duration::from_secs(30),
        multiplier: 2.0,
    };
    let orch = orchestrator(store.clone(), clock.clone(), policy);

    match orch.run_with_retry(day(12)).await {
        Err(OrchestrationError::RetriesExhausted {
            date,
            attempts,
            source,
        }) => {
            assert_eq!(date, day(12));
            assert_eq!(attempts, 3);
            assert!(matches!(source, AccrualError::StatsUnavailable(_)));
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }

    let waits: Vec<u64> = clock.sleeps().iter().map(|d| d.as_secs()).collect();
    assert_eq!(waits, vec![30, 60]);
    assert!(store.ledger_entries().is_empty());
}

#[tokio::test]
async fn scheduled_run_waits_for_run_time_and_uses_that_date() {
    let store = Arc::new(store());
    let clock = Arc::new(ManualClock::at(day(12).and_hms_opt(20, 0, 0).unwrap()));
    let orch = orchestrator(
        store.clone(),
        clock.clone(),
        RetryPolicy::fixed(0, Duration::from_secs(60)),
    );

    let summary = orch.run_next_scheduled().await.unwrap();

    assert_eq!(summary.date, day(12));
    assert_eq!(summary.total_accrued, 400);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(3 * 60 * 60 + 30 * 60)]);
}
