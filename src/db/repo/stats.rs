//! Box-score statistic and schedule operations for the repository.

use crate::domain::{PlayerId, PlayerStats, ScheduleEntry, StatKind, TeamId, TeamStats};
use crate::store::StoreError;
use chrono::{Duration, NaiveDate};
use sqlx::Row;

use super::{date_from_sql, date_to_sql, Repository};

impl Repository {
    /// Record a team statistic for a date, replacing any previous count.
    pub async fn insert_team_stat(
        &self,
        date: NaiveDate,
        team_id: TeamId,
        kind: &StatKind,
        count: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO team_stats (game_date, team_id, stat_kind, count)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(game_date, team_id, stat_kind) DO UPDATE SET count = excluded.count
            "#,
        )
        .bind(date_to_sql(date))
        .bind(team_id.as_i64())
        .bind(kind.as_str())
        .bind(count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a player statistic for a date, replacing any previous count.
    pub async fn insert_player_stat(
        &self,
        date: NaiveDate,
        player_id: PlayerId,
        team_id: TeamId,
        kind: &StatKind,
        count: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO player_stats (game_date, player_id, team_id, stat_kind, count)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(game_date, player_id, stat_kind) DO UPDATE SET
                team_id = excluded.team_id,
                count = excluded.count
            "#,
        )
        .bind(date_to_sql(date))
        .bind(player_id.as_i64())
        .bind(team_id.as_i64())
        .bind(kind.as_str())
        .bind(count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a game to the schedule.
    pub async fn insert_schedule_entry(&self, game: &ScheduleEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO schedule (game_date, home_team_id, away_team_id, home_score, away_score)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(date_to_sql(game.date))
        .bind(game.home_team_id.as_i64())
        .bind(game.away_team_id.as_i64())
        .bind(game.home_score)
        .bind(game.away_score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub(super) async fn query_team_stats(&self, date: NaiveDate) -> Result<TeamStats, sqlx::Error> {
        let rows = sqlx::query("SELECT team_id, stat_kind, count FROM team_stats WHERE game_date = ?")
            .bind(date_to_sql(date))
            .fetch_all(&self.pool)
            .await?;

        let mut stats = TeamStats::new();
        for row in rows {
            stats
                .entry(TeamId::new(row.try_get("team_id")?))
                .or_default()
                .insert(
                    StatKind::new(row.try_get::<String, _>("stat_kind")?),
                    row.try_get("count")?,
                );
        }
        Ok(stats)
    }

    pub(super) async fn query_player_stats(
        &self,
        date: NaiveDate,
    ) -> Result<PlayerStats, sqlx::Error> {
        let rows =
            sqlx::query("SELECT player_id, stat_kind, count FROM player_stats WHERE game_date = ?")
                .bind(date_to_sql(date))
                .fetch_all(&self.pool)
                .await?;

        let mut stats = PlayerStats::new();
        for row in rows {
            stats
                .entry(PlayerId::new(row.try_get("player_id")?))
                .or_default()
                .insert(
                    StatKind::new(row.try_get::<String, _>("stat_kind")?),
                    row.try_get("count")?,
                );
        }
        Ok(stats)
    }

    /// Games in the `days` calendar days ending on `date`, oldest first.
    pub(super) async fn query_schedule_window(
        &self,
        date: NaiveDate,
        days: u32,
    ) -> Result<Vec<ScheduleEntry>, StoreError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let start = date - Duration::days(i64::from(days) - 1);

        let rows = sqlx::query(
            r#"
            SELECT game_date, home_team_id, away_team_id, home_score, away_score
            FROM schedule
            WHERE game_date >= ? AND game_date <= ?
            ORDER BY game_date ASC, id ASC
            "#,
        )
        .bind(date_to_sql(start))
        .bind(date_to_sql(date))
        .fetch_all(&self.pool)
        .await?;

        let mut games = Vec::with_capacity(rows.len());
        for row in rows {
            games.push(ScheduleEntry {
                date: date_from_sql(&row.try_get::<String, _>("game_date")?)?,
                home_team_id: TeamId::new(row.try_get("home_team_id")?),
                away_team_id: TeamId::new(row.try_get("away_team_id")?),
                home_score: row.try_get("home_score")?,
                away_score: row.try_get("away_score")?,
            });
        }
        Ok(games)
    }
}
