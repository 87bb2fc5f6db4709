//! Aggregation rules for finalized sessions and the ranking queries over the
//! aggregated rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::phase::PhaseId;
use crate::player::{PlayerAggregate, PlayerId};

/// Default number of ranking rows returned.
pub const DEFAULT_RANKING_LIMIT: usize = 100;
/// Hard cap on ranking rows per query.
pub const MAX_RANKING_LIMIT: usize = 500;

/// Per-player, per-week accumulator keyed by (player, week start).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyScore {
    pub player_id: PlayerId,
    pub week_start: u64,
    pub score: u64,
    pub games_count: u64,
}

impl WeeklyScore {
    pub fn new(player_id: impl Into<PlayerId>, week_start: u64) -> Self {
        Self {
            player_id: player_id.into(),
            week_start,
            score: 0,
            games_count: 0,
        }
    }

    /// Additive upsert: add the session score and count the game.
    pub fn accumulate(&mut self, score: u64) {
        self.score = self.score.saturating_add(score);
        self.games_count += 1;
    }
}

/// One row of a ranking response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub position: usize,
    pub player: PlayerId,
    pub score: u64,
    pub phase: PhaseId,
    pub combo: u32,
}

/// Clamp a requested ranking size into `1..=max`, defaulting when absent.
pub fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    match requested {
        Some(0) | None => default.min(max),
        Some(n) => n.min(max),
    }
}

/// Rank players by lifetime total, descending. Ties break on player id.
pub fn rank_global<'a>(
    aggregates: impl IntoIterator<Item = &'a PlayerAggregate>,
    limit: usize,
) -> Vec<RankingEntry> {
    let mut rows: Vec<&PlayerAggregate> = aggregates.into_iter().collect();
    rows.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    rows.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, agg)| RankingEntry {
            position: i + 1,
            player: agg.player_id.clone(),
            score: agg.total_score,
            phase: agg.highest_phase,
            combo: agg.highest_combo,
        })
        .collect()
}

/// Rank one week's accumulators, descending. Phase and combo come from the
/// player's lifetime aggregate.
pub fn rank_weekly<'a>(
    weekly: impl IntoIterator<Item = &'a WeeklyScore>,
    aggregates: &HashMap<PlayerId, PlayerAggregate>,
    week_start: u64,
    limit: usize,
) -> Vec<RankingEntry> {
    let mut rows: Vec<&WeeklyScore> = weekly
        .into_iter()
        .filter(|w| w.week_start == week_start)
        .collect();
    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    rows.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, w)| {
            let agg = aggregates.get(&w.player_id);
            RankingEntry {
                position: i + 1,
                player: w.player_id.clone(),
                score: w.score,
                phase: agg.map_or(1, |a| a.highest_phase),
                combo: agg.map_or(0, |a| a.highest_combo),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_summary;

    fn agg(player: &str, total: u64) -> PlayerAggregate {
        let mut a = PlayerAggregate::new(player);
        a.merge_session(&make_summary(player, total, 2, 5));
        a
    }

    #[test]
    fn global_ranking_sorts_descending_with_positions() {
        let rows = [agg("a", 100), agg("b", 900), agg("c", 400)];
        let ranked = rank_global(rows.iter(), 10);
        let order: Vec<_> = ranked.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(ranked[0].position, 1);
        assert_eq!(ranked[2].position, 3);
        assert_eq!(ranked[0].phase, 2);
        assert_eq!(ranked[0].combo, 5);
    }

    #[test]
    fn global_ranking_respects_limit_and_ties() {
        let rows = [agg("z", 50), agg("y", 50), agg("x", 10)];
        let ranked = rank_global(rows.iter(), 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].player, "y");
        assert_eq!(ranked[1].player, "z");
    }

    #[test]
    fn weekly_ranking_filters_week_and_joins_aggregate() {
        let mut aggregates = HashMap::new();
        aggregates.insert("a".to_string(), agg("a", 1));
        let mut this_week = WeeklyScore::new("a", 700);
        this_week.accumulate(300);
        this_week.accumulate(200);
        let mut other = WeeklyScore::new("b", 700);
        other.accumulate(900);
        let mut old = WeeklyScore::new("c", 0);
        old.accumulate(10_000);

        let ranked = rank_weekly([&this_week, &other, &old], &aggregates, 700, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].player, "b");
        assert_eq!(ranked[0].phase, 1);
        assert_eq!(ranked[1].score, 500);
        assert_eq!(ranked[1].phase, 2);
        assert_eq!(this_week.games_count, 2);
    }

    #[test]
    fn limit_clamping() {
        assert_eq!(clamp_limit(None, 100, 500), 100);
        assert_eq!(clamp_limit(Some(0), 100, 500), 100);
        assert_eq!(clamp_limit(Some(7), 100, 500), 7);
        assert_eq!(clamp_limit(Some(10_000), 100, 500), 500);
    }
}
