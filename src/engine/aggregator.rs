use crate::domain::{
    GameOutcome, PlayerId, PlayerStats, ScheduleEntry, StatKind, TeamId, TeamStats,
};
use crate::store::{AccrualStore, StoreError};
use chrono::NaiveDate;

/// Calendar days inspected by the sweep check, ending on the target date.
pub const SWEEP_WINDOW_DAYS: u32 = 3;

/// One game from a single team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamGame {
    pub date: NaiveDate,
    pub opponent: TeamId,
    pub outcome: GameOutcome,
}

/// Statistics for one target date plus the schedule lookback window.
///
/// Missing rows read as zero; a team without a game simply has no entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDay {
    pub date: NaiveDate,
    pub team_stats: TeamStats,
    pub player_stats: PlayerStats,
    /// Games in the [`SWEEP_WINDOW_DAYS`] ending on `date`, oldest first.
    pub schedule: Vec<ScheduleEntry>,
}

impl GameDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            team_stats: TeamStats::new(),
            player_stats: PlayerStats::new(),
            schedule: Vec::new(),
        }
    }

    pub fn team_stat(&self, team: TeamId, kind: &StatKind) -> i64 {
        self.team_stats
            .get(&team)
            .and_then(|stats| stats.get(kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn player_stat(&self, player: PlayerId, kind: &StatKind) -> i64 {
        self.player_stats
            .get(&player)
            .and_then(|stats| stats.get(kind))
            .copied()
            .unwrap_or(0)
    }

    /// Opponent of `team` on the target date (first game of a doubleheader).
    pub fn opponent_on_date(&self, team: TeamId) -> Option<TeamId> {
        self.schedule
            .iter()
            .filter(|g| g.date == self.date)
            .find_map(|g| g.opponent_of(team))
    }

    /// Games `team` played in the lookback window, oldest first.
    pub fn recent_games(&self, team: TeamId) -> Vec<TeamGame> {
        self.schedule
            .iter()
            .filter_map(|g| {
                Some(TeamGame {
                    date: g.date,
                    opponent: g.opponent_of(team)?,
                    outcome: g.outcome_for(team)?,
                })
            })
            .collect()
    }
}

/// Builds the in-memory statistic maps for a date.
pub struct GameStatsAggregator;

impl GameStatsAggregator {
    /// Load team stats, player stats and the sweep lookback window for `date`.
    ///
    /// # Errors
    /// Returns an error if the statistics or schedule store cannot be read.
    pub async fn load(store: &dyn AccrualStore, date: NaiveDate) -> Result<GameDay, StoreError> {
        let team_stats = store.get_team_stats(date).await?;
        let player_stats = store.get_player_stats(date).await?;
        let schedule = store.get_schedule_window(date, SWEEP_WINDOW_DAYS).await?;

        tracing::info!(
            %date,
            teams = team_stats.len(),
            players = player_stats.len(),
            games_in_window = schedule.len(),
            "Loaded game statistics"
        );

        Ok(GameDay {
            date,
            team_stats,
            player_stats,
            schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_missing_stats_read_as_zero() {
        let game_day = GameDay::new(day(1));
        assert_eq!(game_day.team_stat(TeamId::new(1), &StatKind::from("hit")), 0);
        assert_eq!(
            game_day.player_stat(PlayerId::new(1), &StatKind::from("hit")),
            0
        );
        assert_eq!(game_day.opponent_on_date(TeamId::new(1)), None);
    }

    #[test]
    fn test_opponent_ignores_earlier_days() {
        let mut game_day = GameDay::new(day(3));
        game_day
            .schedule
            .push(ScheduleEntry::new(day(2), TeamId::new(1), TeamId::new(5)));
        assert_eq!(game_day.opponent_on_date(TeamId::new(1)), None);

        game_day
            .schedule
            .push(ScheduleEntry::new(day(3), TeamId::new(6), TeamId::new(1)));
        assert_eq!(game_day.opponent_on_date(TeamId::new(1)), Some(TeamId::new(6)));
    }

    #[test]
    fn test_recent_games_only_for_team() {
        let mut game_day = GameDay::new(day(3));
        game_day
            .schedule
            .push(ScheduleEntry::new(day(2), TeamId::new(1), TeamId::new(5)).with_score(3, 1));
        game_day
            .schedule
            .push(ScheduleEntry::new(day(3), TeamId::new(7), TeamId::new(8)));

        let games = game_day.recent_games(TeamId::new(1));
        assert_eq!(
            games,
            vec![TeamGame {
                date: day(2),
                opponent: TeamId::new(5),
                outcome: GameOutcome::Win,
            }]
        );
    }

    #[tokio::test]
    async fn test_load_reads_window() {
        let store = MockStore::new()
            .with_team_stat(day(3), TeamId::new(1), "hit", 9)
            .with_game(ScheduleEntry::new(day(1), TeamId::new(1), TeamId::new(2)))
            .with_game(ScheduleEntry::new(day(3), TeamId::new(1), TeamId::new(2)));

        let game_day = GameStatsAggregator::load(&store, day(3)).await.unwrap();
        assert_eq!(game_day.team_stat(TeamId::new(1), &StatKind::from("hit")), 9);
        assert_eq!(game_day.schedule.len(), 2);
    }
}
