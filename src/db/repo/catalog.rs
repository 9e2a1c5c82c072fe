//! Account, roster and savings rule operations for the repository.

use crate::domain::{
    Account, AccountId, BoundPlayer, PlayerId, PlayerPosition, RuleCategory, RuleId, SavingsRule,
    StatKind, TeamId,
};
use crate::store::StoreError;
use sqlx::Row;

use super::Repository;

impl Repository {
    /// Insert or replace an account.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_account(&self, account: &Account) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, team_id, daily_limit, month_limit, running_balance)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                team_id = excluded.team_id,
                daily_limit = excluded.daily_limit,
                month_limit = excluded.month_limit
            "#,
        )
        .bind(account.id.as_i64())
        .bind(account.team_id.as_i64())
        .bind(account.daily_limit)
        .bind(account.month_limit)
        .bind(account.running_balance)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a roster entry.
    pub async fn insert_player(
        &self,
        id: PlayerId,
        team_id: TeamId,
        name: &str,
        position: PlayerPosition,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO players (id, team_id, name, position) VALUES (?, ?, ?, ?)")
            .bind(id.as_i64())
            .bind(team_id.as_i64())
            .bind(name)
            .bind(position.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a savings rule. The bound player's position is not stored on the
    /// rule; it is joined from the roster on read.
    pub async fn insert_rule(&self, rule: &SavingsRule) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO savings_rules (id, account_id, ordinal, category, stat_kind, player_id, amount_per_unit)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rule.id.as_i64())
        .bind(rule.account_id.as_i64())
        .bind(rule.ordinal)
        .bind(rule.category.as_str())
        .bind(rule.stat_kind.as_str())
        .bind(rule.bound_player.map(|p| p.id.as_i64()))
        .bind(rule.amount_per_unit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub(super) async fn query_account_ids(&self) -> Result<Vec<AccountId>, sqlx::Error> {
        let rows = sqlx::query("SELECT id FROM accounts ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>("id").map(AccountId::new))
            .collect()
    }

    pub(super) async fn query_account(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, team_id, daily_limit, month_limit, running_balance FROM accounts WHERE id = ?",
        )
        .bind(account_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> Result<Account, sqlx::Error> {
            Ok(Account {
                id: AccountId::new(r.try_get("id")?),
                team_id: TeamId::new(r.try_get("team_id")?),
                daily_limit: r.try_get("daily_limit")?,
                month_limit: r.try_get("month_limit")?,
                running_balance: r.try_get("running_balance")?,
            })
        })
        .transpose()
    }

    /// Rules of an account ordered by (ordinal, id), with roster positions.
    pub(super) async fn query_account_rules(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<SavingsRule>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT sr.id, sr.account_id, sr.ordinal, sr.category, sr.stat_kind,
                   sr.player_id, sr.amount_per_unit, p.position
            FROM savings_rules sr
            LEFT JOIN players p ON p.id = sr.player_id
            WHERE sr.account_id = ?
            ORDER BY sr.ordinal ASC, sr.id ASC
            "#,
        )
        .bind(account_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let category_str: String = row.try_get("category")?;
            let category = category_str
                .parse::<RuleCategory>()
                .map_err(StoreError::Corrupt)?;

            let position = row
                .try_get::<Option<String>, _>("position")?
                .map(|p| p.parse::<PlayerPosition>())
                .transpose()
                .map_err(StoreError::Corrupt)?;
            let bound_player = row
                .try_get::<Option<i64>, _>("player_id")?
                .map(|id| BoundPlayer {
                    id: PlayerId::new(id),
                    position,
                });

            rules.push(SavingsRule {
                id: RuleId::new(row.try_get("id")?),
                account_id: AccountId::new(row.try_get("account_id")?),
                ordinal: row.try_get("ordinal")?,
                category,
                stat_kind: StatKind::new(row.try_get::<String, _>("stat_kind")?),
                bound_player,
                amount_per_unit: row.try_get("amount_per_unit")?,
            });
        }

        Ok(rules)
    }
}
