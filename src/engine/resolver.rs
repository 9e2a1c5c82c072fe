use super::aggregator::{GameDay, SWEEP_WINDOW_DAYS};
use crate::domain::{Account, GameOutcome, MalformedRule, RuleCategory, RuleId, SavingsRule, TeamId};

/// A rule together with the count it resolved to on the target date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub rule: SavingsRule,
    pub count: i64,
}

/// Output of resolving an account's rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// In the same order as the input rules.
    pub resolved: Vec<ResolvedRule>,
    pub malformed: Vec<(RuleId, MalformedRule)>,
}

/// Resolve each rule of `account` to a statistic count.
///
/// Malformed rules are logged and skipped; they never abort the account.
pub fn resolve_rules(day: &GameDay, account: &Account, rules: &[SavingsRule]) -> Resolution {
    let mut resolution = Resolution::default();

    for rule in rules {
        let bound_player = match rule.validate() {
            Ok(player) => player,
            Err(reason) => {
                tracing::warn!(
                    account_id = %account.id,
                    rule_id = %rule.id,
                    category = %rule.category,
                    %reason,
                    "Skipping malformed savings rule"
                );
                resolution.malformed.push((rule.id, reason));
                continue;
            }
        };

        let count = match (rule.category, bound_player) {
            (RuleCategory::Basic, _) if rule.stat_kind.is_sweep() => {
                sweep_count(day, account.team_id)
            }
            (RuleCategory::Basic, _) => day.team_stat(account.team_id, &rule.stat_kind),
            (RuleCategory::Opponent, _) => day
                .opponent_on_date(account.team_id)
                .map(|opponent| day.team_stat(opponent, &rule.stat_kind))
                .unwrap_or(0),
            (RuleCategory::Pitcher | RuleCategory::Batter, Some(player)) => {
                day.player_stat(player, &rule.stat_kind)
            }
            // validate() guarantees a player for player-bound categories
            (RuleCategory::Pitcher | RuleCategory::Batter, None) => 0,
        };

        resolution.resolved.push(ResolvedRule {
            rule: rule.clone(),
            count,
        });
    }

    resolution
}

/// 1 if `team` won every game of the lookback window against one opponent.
///
/// The window is calendar days, not consecutive games: exactly
/// [`SWEEP_WINDOW_DAYS`] games must fall inside it, so an off-day inside the
/// window (or a doubleheader) changes the result.
pub fn sweep_count(day: &GameDay, team: TeamId) -> i64 {
    let games = day.recent_games(team);
    if games.len() != SWEEP_WINDOW_DAYS as usize {
        return 0;
    }

    let opponent = games[0].opponent;
    let swept = games
        .iter()
        .all(|g| g.opponent == opponent && g.outcome == GameOutcome::Win);

    if swept {
        tracing::debug!(%team, %opponent, date = %day.date, "Sweep detected");
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccountId, BoundPlayer, PlayerId, PlayerPosition, ScheduleEntry, StatKind,
    };
    use chrono::NaiveDate;

    const HOME: TeamId = TeamId(1);
    const RIVAL: TeamId = TeamId(2);
    const OTHER: TeamId = TeamId(3);

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn account() -> Account {
        Account::new(AccountId::new(1), HOME, 10_000, 100_000)
    }

    fn rule(id: i64, category: RuleCategory, kind: &str) -> SavingsRule {
        SavingsRule {
            id: RuleId::new(id),
            account_id: AccountId::new(1),
            ordinal: id as i32,
            category,
            stat_kind: StatKind::from(kind),
            bound_player: None,
            amount_per_unit: 100,
        }
    }

    fn game_day_with_series(results: [(u32, TeamId, i32, i32); 3]) -> GameDay {
        let mut game_day = GameDay::new(day(3));
        for (d, opponent, own, other) in results {
            game_day
                .schedule
                .push(ScheduleEntry::new(day(d), HOME, opponent).with_score(own, other));
        }
        game_day
    }

    #[test]
    fn test_basic_rule_reads_own_team() {
        let mut game_day = GameDay::new(day(3));
        game_day
            .team_stats
            .entry(HOME)
            .or_default()
            .insert(StatKind::from("hit"), 11);

        let resolution = resolve_rules(&game_day, &account(), &[rule(1, RuleCategory::Basic, "hit")]);
        assert_eq!(resolution.resolved[0].count, 11);
    }

    #[test]
    fn test_opponent_rule_reads_opposing_team() {
        let mut game_day = GameDay::new(day(3));
        game_day.schedule.push(ScheduleEntry::new(day(3), RIVAL, HOME));
        game_day
            .team_stats
            .entry(RIVAL)
            .or_default()
            .insert(StatKind::from("error"), 2);

        let resolution = resolve_rules(
            &game_day,
            &account(),
            &[rule(1, RuleCategory::Opponent, "error")],
        );
        assert_eq!(resolution.resolved[0].count, 2);
    }

    #[test]
    fn test_opponent_rule_without_game_is_zero() {
        let resolution = resolve_rules(
            &GameDay::new(day(3)),
            &account(),
            &[rule(1, RuleCategory::Opponent, "error")],
        );
        assert_eq!(resolution.resolved[0].count, 0);
    }

    #[test]
    fn test_player_rule_reads_bound_player() {
        let mut game_day = GameDay::new(day(3));
        game_day
            .player_stats
            .entry(PlayerId::new(21))
            .or_default()
            .insert(StatKind::from("strikeout"), 8);

        let mut pitcher = rule(1, RuleCategory::Pitcher, "strikeout");
        pitcher.bound_player = Some(BoundPlayer {
            id: PlayerId::new(21),
            position: Some(PlayerPosition::Pitcher),
        });
        let mut idle = rule(2, RuleCategory::Pitcher, "strikeout");
        idle.bound_player = Some(BoundPlayer {
            id: PlayerId::new(22),
            position: Some(PlayerPosition::Pitcher),
        });

        let resolution = resolve_rules(&game_day, &account(), &[pitcher, idle]);
        assert_eq!(resolution.resolved[0].count, 8);
        assert_eq!(resolution.resolved[1].count, 0);
    }

    #[test]
    fn test_malformed_rule_is_skipped_and_order_kept() {
        let rules = [
            rule(1, RuleCategory::Basic, "hit"),
            rule(2, RuleCategory::Batter, "home_run"),
            rule(3, RuleCategory::Basic, "win"),
        ];
        let resolution = resolve_rules(&GameDay::new(day(3)), &account(), &rules);

        let ids: Vec<RuleId> = resolution.resolved.iter().map(|r| r.rule.id).collect();
        assert_eq!(ids, vec![RuleId::new(1), RuleId::new(3)]);
        assert_eq!(
            resolution.malformed,
            vec![(RuleId::new(2), MalformedRule::MissingPlayer)]
        );
    }

    #[test]
    fn test_sweep_three_wins_same_opponent() {
        let game_day = game_day_with_series([(1, RIVAL, 4, 2), (2, RIVAL, 6, 5), (3, RIVAL, 1, 0)]);
        assert_eq!(sweep_count(&game_day, HOME), 1);

        let resolution = resolve_rules(&game_day, &account(), &[rule(1, RuleCategory::Basic, "sweep")]);
        assert_eq!(resolution.resolved[0].count, 1);
    }

    #[test]
    fn test_sweep_broken_by_different_opponent() {
        let game_day = game_day_with_series([(1, OTHER, 4, 2), (2, RIVAL, 6, 5), (3, RIVAL, 1, 0)]);
        assert_eq!(sweep_count(&game_day, HOME), 0);
    }

    #[test]
    fn test_sweep_broken_by_loss_or_draw() {
        let lost = game_day_with_series([(1, RIVAL, 4, 2), (2, RIVAL, 2, 5), (3, RIVAL, 1, 0)]);
        assert_eq!(sweep_count(&lost, HOME), 0);

        let drawn = game_day_with_series([(1, RIVAL, 4, 2), (2, RIVAL, 5, 5), (3, RIVAL, 1, 0)]);
        assert_eq!(sweep_count(&drawn, HOME), 0);
    }

    #[test]
    fn test_sweep_needs_exactly_three_games() {
        let mut game_day = GameDay::new(day(3));
        for d in [2, 3] {
            game_day
                .schedule
                .push(ScheduleEntry::new(day(d), HOME, RIVAL).with_score(3, 0));
        }
        assert_eq!(sweep_count(&game_day, HOME), 0);
    }

    #[test]
    fn test_sweep_stat_on_opponent_rule_reads_box_score() {
        let game_day = game_day_with_series([(1, RIVAL, 4, 2), (2, RIVAL, 6, 5), (3, RIVAL, 1, 0)]);
        let resolution = resolve_rules(
            &game_day,
            &account(),
            &[rule(1, RuleCategory::Opponent, "sweep")],
        );
        assert_eq!(resolution.resolved[0].count, 0);
    }
}
