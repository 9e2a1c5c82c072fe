pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Account, AccountId, LedgerEntry, PlayerId, RuleCategory, RuleId, SavingsRule, ScheduleEntry,
    StatKind, TeamId, TransferInstruction,
};
pub use error::AppError;
pub use orchestration::{AccrualRunner, Orchestrator, RetryPolicy, RunSettings, Summary};
pub use store::{AccrualStore, MockStore, StoreError};
