//! Domain types for the savings accrual engine.
//!
//! This module provides:
//! - Identifier primitives: AccountId, TeamId, PlayerId, RuleId, StatKind
//! - Accounts and their savings rules (closed `RuleCategory` dispatch)
//! - Schedule rows and box-score statistic maps
//! - Ledger entries and transfer instructions

pub mod account;
pub mod game;
pub mod ledger;
pub mod primitives;
pub mod rule;

pub use account::Account;
pub use game::{GameOutcome, PlayerStats, ScheduleEntry, TeamStats};
pub use ledger::{AccountCommit, CommitResult, LedgerEntry, LedgerKey, TransferInstruction};
pub use primitives::{AccountId, PlayerId, RuleId, StatKind, TeamId};
pub use rule::{BoundPlayer, MalformedRule, PlayerPosition, RuleCategory, SavingsRule};
