use serde::{Deserialize, Serialize};

use crate::phase::PhaseId;
use crate::session::SessionSummary;

/// Opaque player identifier issued by the auth collaborator.
pub type PlayerId = String;

/// Lifetime statistics for one player. Only changes when a session ends.
///
/// Totals only grow; "highest"/"best" fields only move via `max`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    pub player_id: PlayerId,
    pub total_score: u64,
    pub highest_phase: PhaseId,
    pub highest_combo: u32,
    pub games_played: u64,
    /// Best single-session score, used for the "new record" flag.
    pub best_score: u64,
}

impl PlayerAggregate {
    pub fn new(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            total_score: 0,
            highest_phase: 1,
            highest_combo: 0,
            games_played: 0,
            best_score: 0,
        }
    }

    /// Fold a finalized session into the lifetime totals.
    pub fn merge_session(&mut self, summary: &SessionSummary) {
        self.total_score = self.total_score.saturating_add(summary.final_score);
        self.highest_phase = self.highest_phase.max(summary.phase_reached);
        self.highest_combo = self.highest_combo.max(summary.max_combo);
        self.games_played += 1;
        self.best_score = self.best_score.max(summary.final_score);
    }

    /// Whether `score` would beat this player's best session.
    pub fn is_new_record(&self, score: u64) -> bool {
        score > 0 && score > self.best_score
    }
}
