//! Batch orchestration: the per-date accrual run and its retrying scheduler.

pub mod clock;
pub mod orchestrator;
pub mod runner;

pub use clock::{Clock, SystemClock};
pub use orchestrator::{next_run_at, JobAttempt, OrchestrationError, Orchestrator, RetryPolicy};
pub use runner::{
    AccountError, AccrualError, AccrualRunner, FailedAccount, FailureKind, RunSettings, Summary,
};
