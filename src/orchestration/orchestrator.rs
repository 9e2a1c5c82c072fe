use super::clock::Clock;
use super::runner::{AccrualError, AccrualRunner, Summary};
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// How often and how long to wait before re-running a failed date.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Re-runs after the first attempt.
    pub max_retries: u32,
    /// Wait before the first re-run.
    pub delay: Duration,
    /// Growth of the wait per re-run; 1.0 keeps it fixed.
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            multiplier: 1.0,
        }
    }

    /// Jitter-free backoff schedule for one job.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.delay)
            .with_randomization_factor(0.0)
            .with_multiplier(self.multiplier.max(1.0))
            .with_max_interval(MAX_RETRY_INTERVAL.max(self.delay))
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Retry state of one scheduled date, passed by value through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAttempt {
    pub date: NaiveDate,
    /// 0 for the first attempt.
    pub attempt: u32,
}

impl JobAttempt {
    pub fn first(date: NaiveDate) -> Self {
        Self { date, attempt: 0 }
    }

    pub fn next(self) -> Self {
        Self {
            date: self.date,
            attempt: self.attempt + 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("accrual for {date} failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        date: NaiveDate,
        attempts: u32,
        #[source]
        source: AccrualError,
    },
}

/// Invokes the accrual runner once per date and retries failed runs.
pub struct Orchestrator {
    runner: Arc<AccrualRunner>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    run_at: NaiveTime,
}

impl Orchestrator {
    pub fn new(
        runner: Arc<AccrualRunner>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
        run_at: NaiveTime,
    ) -> Self {
        Self {
            runner,
            clock,
            policy,
            run_at,
        }
    }

    /// Run the accrual for `date`, re-running on failure per the retry policy.
    ///
    /// Re-runs are safe because the runner is idempotent per (account, date).
    pub async fn run_with_retry(&self, date: NaiveDate) -> Result<Summary, OrchestrationError> {
        let mut backoff = self.policy.backoff();
        let mut job = JobAttempt::first(date);

        loop {
            match self.runner.process_accrual_for_date(job.date).await {
                Ok(summary) => {
                    if job.attempt > 0 {
                        info!(date = %job.date, attempt = job.attempt, "Accrual succeeded after retry");
                    }
                    return Ok(summary);
                }
                Err(err) if job.attempt < self.policy.max_retries => {
                    let delay = backoff.next_backoff().unwrap_or(self.policy.delay);
                    warn!(
                        date = %job.date,
                        attempt = job.attempt,
                        retry_in_ms = millis(delay),
                        error = %err,
                        "Accrual run failed, rescheduling"
                    );
                    self.clock.sleep(delay).await;
                    job = job.next();
                }
                Err(err) => {
                    error!(
                        date = %job.date,
                        attempts = job.attempt + 1,
                        error = %err,
                        "Accrual retries exhausted, giving up"
                    );
                    return Err(OrchestrationError::RetriesExhausted {
                        date: job.date,
                        attempts: job.attempt + 1,
                        source: err,
                    });
                }
            }
        }
    }

    /// Wait for the next scheduled run time and run that calendar date.
    pub async fn run_next_scheduled(&self) -> Result<Summary, OrchestrationError> {
        let now = self.clock.now();
        let next = next_run_at(now, self.run_at);
        let wait = (next - now).to_std().unwrap_or_default();

        info!(next_run = %next, wait_secs = wait.as_secs(), "Waiting for next accrual run");
        self.clock.sleep(wait).await;

        self.run_with_retry(next.date()).await
    }

    /// Run every day at the configured time, forever.
    pub async fn run_scheduled(&self) {
        loop {
            match self.run_next_scheduled().await {
                Ok(summary) => info!(
                    date = %summary.date,
                    total_accrued = summary.total_accrued,
                    "Scheduled accrual complete"
                ),
                Err(err) => error!(error = %err, "Scheduled accrual abandoned"),
            }
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// The first `run_at` strictly after `now`.
pub fn next_run_at(now: NaiveDateTime, run_at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(run_at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}
