/// Outcome of offering one candidate amount to the enforcer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    /// Accepted, possibly reduced to the remaining capacity.
    Accepted { amount: i64, clamped: bool },
    /// No capacity left under one of the ceilings.
    Exhausted,
}

/// Running daily and monthly totals for one account.
///
/// Candidates are offered in rule order, so earlier rules claim capacity first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitEnforcer {
    daily_limit: i64,
    month_limit: i64,
    daily_accumulated: i64,
    monthly_accumulated: i64,
}

impl LimitEnforcer {
    /// `daily_committed` is what is already committed for the target date;
    /// `month_other_days` is the month's committed total on every other day.
    pub fn new(
        daily_limit: i64,
        month_limit: i64,
        daily_committed: i64,
        month_other_days: i64,
    ) -> Self {
        Self {
            daily_limit,
            month_limit,
            daily_accumulated: daily_committed,
            // today's committed amount also counts against the month
            monthly_accumulated: month_other_days.saturating_add(daily_committed),
        }
    }

    pub fn apply(&mut self, requested: i64) -> LimitDecision {
        let mut amount = requested;

        if self.daily_accumulated.saturating_add(amount) > self.daily_limit {
            amount = (self.daily_limit - self.daily_accumulated).max(0);
        }
        if self.monthly_accumulated.saturating_add(amount) > self.month_limit {
            amount = (self.month_limit - self.monthly_accumulated).max(0);
        }

        if amount <= 0 {
            return LimitDecision::Exhausted;
        }

        self.daily_accumulated += amount;
        self.monthly_accumulated += amount;
        LimitDecision::Accepted {
            amount,
            clamped: amount < requested,
        }
    }

    pub fn daily_accumulated(&self) -> i64 {
        self.daily_accumulated
    }

    pub fn monthly_accumulated(&self) -> i64 {
        self.monthly_accumulated
    }
}
