//! User-configured savings rules.

use crate::domain::{AccountId, PlayerId, RuleId, StatKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which performance a rule tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// The account's own team.
    Basic,
    /// The team the account's team played on the date.
    Opponent,
    /// A bound pitcher.
    Pitcher,
    /// A bound batter.
    Batter,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Basic => "basic",
            RuleCategory::Opponent => "opponent",
            RuleCategory::Pitcher => "pitcher",
            RuleCategory::Batter => "batter",
        }
    }

    /// Position a bound player must have, for player-bound categories.
    pub fn required_position(&self) -> Option<PlayerPosition> {
        match self {
            RuleCategory::Pitcher => Some(PlayerPosition::Pitcher),
            RuleCategory::Batter => Some(PlayerPosition::Batter),
            RuleCategory::Basic | RuleCategory::Opponent => None,
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(RuleCategory::Basic),
            "opponent" => Ok(RuleCategory::Opponent),
            "pitcher" => Ok(RuleCategory::Pitcher),
            "batter" => Ok(RuleCategory::Batter),
            other => Err(format!("unknown rule category: {}", other)),
        }
    }
}

/// Roster position of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPosition {
    Pitcher,
    Batter,
}

impl PlayerPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerPosition::Pitcher => "pitcher",
            PlayerPosition::Batter => "batter",
        }
    }
}

impl FromStr for PlayerPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pitcher" => Ok(PlayerPosition::Pitcher),
            "batter" => Ok(PlayerPosition::Batter),
            other => Err(format!("unknown player position: {}", other)),
        }
    }
}

/// A player a Pitcher/Batter rule is bound to, as known to the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundPlayer {
    pub id: PlayerId,
    /// `None` when the player id does not exist in the roster.
    pub position: Option<PlayerPosition>,
}

/// One savings rule of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsRule {
    pub id: RuleId,
    pub account_id: AccountId,
    /// Persisted evaluation order; lower ordinals claim limit capacity first.
    pub ordinal: i32,
    pub category: RuleCategory,
    pub stat_kind: StatKind,
    pub bound_player: Option<BoundPlayer>,
    pub amount_per_unit: i64,
}

/// Why a rule cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRule {
    MissingPlayer,
    UnknownPlayer(PlayerId),
    PositionMismatch {
        player: PlayerId,
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    NonPositiveAmount(i64),
}

impl std::fmt::Display for MalformedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedRule::MissingPlayer => write!(f, "player-bound rule has no player"),
            MalformedRule::UnknownPlayer(id) => write!(f, "bound player {} is not on any roster", id),
            MalformedRule::PositionMismatch {
                player,
                expected,
                actual,
            } => write!(
                f,
                "bound player {} is a {}, rule expects a {}",
                player,
                actual.as_str(),
                expected.as_str()
            ),
            MalformedRule::NonPositiveAmount(amount) => {
                write!(f, "amount per unit must be positive, got {}", amount)
            }
        }
    }
}

impl SavingsRule {
    /// Check the structural invariants of the rule.
    ///
    /// Returns the bound player id for Pitcher/Batter rules.
    pub fn validate(&self) -> Result<Option<PlayerId>, MalformedRule> {
        if self.amount_per_unit <= 0 {
            return Err(MalformedRule::NonPositiveAmount(self.amount_per_unit));
        }

        let Some(expected) = self.category.required_position() else {
            return Ok(None);
        };

        let player = self.bound_player.ok_or(MalformedRule::MissingPlayer)?;
        match player.position {
            None => Err(MalformedRule::UnknownPlayer(player.id)),
            Some(actual) if actual != expected => Err(MalformedRule::PositionMismatch {
                player: player.id,
                expected,
                actual,
            }),
            Some(_) => Ok(Some(player.id)),
        }
    }

    /// Sort key giving the deterministic evaluation order.
    pub fn order_key(&self) -> (i32, RuleId) {
        (self.ordinal, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(category: RuleCategory, bound_player: Option<BoundPlayer>) -> SavingsRule {
        SavingsRule {
            id: RuleId::new(1),
            account_id: AccountId::new(1),
            ordinal: 0,
            category,
            stat_kind: StatKind::from("strikeout"),
            bound_player,
            amount_per_unit: 100,
        }
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in [
            RuleCategory::Basic,
            RuleCategory::Opponent,
            RuleCategory::Pitcher,
            RuleCategory::Batter,
        ] {
            assert_eq!(category.as_str().parse::<RuleCategory>(), Ok(category));
        }
        assert!("bullpen".parse::<RuleCategory>().is_err());
    }

    #[test]
    fn test_basic_rule_needs_no_player() {
        assert_eq!(rule(RuleCategory::Basic, None).validate(), Ok(None));
    }

    #[test]
    fn test_pitcher_rule_without_player_is_malformed() {
        assert_eq!(
            rule(RuleCategory::Pitcher, None).validate(),
            Err(MalformedRule::MissingPlayer)
        );
    }

    #[test]
    fn test_pitcher_rule_bound_to_batter_is_malformed() {
        let player = BoundPlayer {
            id: PlayerId::new(7),
            position: Some(PlayerPosition::Batter),
        };
        assert!(matches!(
            rule(RuleCategory::Pitcher, Some(player)).validate(),
            Err(MalformedRule::PositionMismatch { .. })
        ));
    }

    #[test]
    fn test_batter_rule_with_unknown_player_is_malformed() {
        let player = BoundPlayer {
            id: PlayerId::new(7),
            position: None,
        };
        assert_eq!(
            rule(RuleCategory::Batter, Some(player)).validate(),
            Err(MalformedRule::UnknownPlayer(PlayerId::new(7)))
        );
    }

    #[test]
    fn test_valid_batter_rule_returns_player() {
        let player = BoundPlayer {
            id: PlayerId::new(7),
            position: Some(PlayerPosition::Batter),
        };
        assert_eq!(
            rule(RuleCategory::Batter, Some(player)).validate(),
            Ok(Some(PlayerId::new(7)))
        );
    }

    #[test]
    fn test_non_positive_amount_is_malformed() {
        let mut r = rule(RuleCategory::Basic, None);
        r.amount_per_unit = 0;
        assert_eq!(r.validate(), Err(MalformedRule::NonPositiveAmount(0)));
    }
}
