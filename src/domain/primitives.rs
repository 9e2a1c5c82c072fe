//! Domain primitives: identifiers and statistic kinds.

use serde::{Deserialize, Serialize};

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                $name(id)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

int_id!(
    /// Savings account identifier.
    AccountId
);
int_id!(
    /// Club identifier.
    TeamId
);
int_id!(
    /// Player identifier.
    PlayerId
);
int_id!(
    /// Savings rule (rule detail) identifier.
    RuleId
);

/// Box-score statistic name (e.g. "win", "hit", "home_run", "sweep").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatKind(pub String);

impl StatKind {
    /// Compound three-day statistic evaluated from the schedule, not the box score.
    pub const SWEEP: &'static str = "sweep";

    pub fn new(kind: impl Into<String>) -> Self {
        StatKind(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_sweep(&self) -> bool {
        self.0 == Self::SWEEP
    }
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StatKind {
    fn from(s: &str) -> Self {
        StatKind(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&AccountId::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_stat_kind_sweep() {
        assert!(StatKind::from("sweep").is_sweep());
        assert!(!StatKind::from("win").is_sweep());
    }

    #[test]
    fn test_id_ordering() {
        assert!(RuleId::new(1) < RuleId::new(2));
    }
}
