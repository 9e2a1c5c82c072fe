//! Savings account.

use crate::domain::{AccountId, TeamId};
use serde::{Deserialize, Serialize};

/// A savings account and its transfer ceilings, in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// The team the account holder supports.
    pub team_id: TeamId,
    pub daily_limit: i64,
    pub month_limit: i64,
    /// Updated by the transfer executor only.
    pub running_balance: i64,
}

impl Account {
    pub fn new(id: AccountId, team_id: TeamId, daily_limit: i64, month_limit: i64) -> Self {
        Self {
            id,
            team_id,
            daily_limit,
            month_limit,
            running_balance: 0,
        }
    }
}
