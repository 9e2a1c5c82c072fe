//! Schedule rows and box-score statistic maps.

use crate::domain::{PlayerId, StatKind, TeamId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-team statistic counts for one date.
pub type TeamStats = HashMap<TeamId, HashMap<StatKind, i64>>;

/// Per-player statistic counts for one date.
pub type PlayerStats = HashMap<PlayerId, HashMap<StatKind, i64>>;

/// One scheduled game. Scores are `None` until the game is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

/// Result of a game from one team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
    /// No final score recorded.
    Pending,
}

impl ScheduleEntry {
    pub fn new(date: NaiveDate, home_team_id: TeamId, away_team_id: TeamId) -> Self {
        Self {
            date,
            home_team_id,
            away_team_id,
            home_score: None,
            away_score: None,
        }
    }

    pub fn with_score(mut self, home_score: i32, away_score: i32) -> Self {
        self.home_score = Some(home_score);
        self.away_score = Some(away_score);
        self
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team_id == team || self.away_team_id == team
    }

    /// The other team, if `team` played in this game.
    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if self.home_team_id == team {
            Some(self.away_team_id)
        } else if self.away_team_id == team {
            Some(self.home_team_id)
        } else {
            None
        }
    }

    /// Outcome for `team`, or `None` if it did not play in this game.
    pub fn outcome_for(&self, team: TeamId) -> Option<GameOutcome> {
        let (own, other) = if self.home_team_id == team {
            (self.home_score, self.away_score)
        } else if self.away_team_id == team {
            (self.away_score, self.home_score)
        } else {
            return None;
        };

        Some(match (own, other) {
            (Some(own), Some(other)) if own > other => GameOutcome::Win,
            (Some(own), Some(other)) if own < other => GameOutcome::Loss,
            (Some(_), Some(_)) => GameOutcome::Draw,
            _ => GameOutcome::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_opponent_of_either_side() {
        let game = ScheduleEntry::new(date(), TeamId::new(1), TeamId::new(2));
        assert_eq!(game.opponent_of(TeamId::new(1)), Some(TeamId::new(2)));
        assert_eq!(game.opponent_of(TeamId::new(2)), Some(TeamId::new(1)));
        assert_eq!(game.opponent_of(TeamId::new(3)), None);
    }

    #[test]
    fn test_outcome_for_home_and_away() {
        let game = ScheduleEntry::new(date(), TeamId::new(1), TeamId::new(2)).with_score(5, 3);
        assert_eq!(game.outcome_for(TeamId::new(1)), Some(GameOutcome::Win));
        assert_eq!(game.outcome_for(TeamId::new(2)), Some(GameOutcome::Loss));
        assert_eq!(game.outcome_for(TeamId::new(9)), None);
    }

    #[test]
    fn test_outcome_draw_and_pending() {
        let tied = ScheduleEntry::new(date(), TeamId::new(1), TeamId::new(2)).with_score(4, 4);
        assert_eq!(tied.outcome_for(TeamId::new(1)), Some(GameOutcome::Draw));

        let unplayed = ScheduleEntry::new(date(), TeamId::new(1), TeamId::new(2));
        assert_eq!(unplayed.outcome_for(TeamId::new(1)), Some(GameOutcome::Pending));
    }
}
