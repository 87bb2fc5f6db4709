pub mod judgment;
pub mod leaderboard;
pub mod net;
pub mod phase;
pub mod player;
pub mod progression;
pub mod scoring;
pub mod session;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use uuid::Uuid;

    use crate::judgment::{ActionKind, Judgment};
    use crate::phase::{PhaseId, PhaseTable};
    use crate::scoring::ScoringConfig;
    use crate::session::{ActionOutcome, SessionState, SessionSummary};

    /// Build an ended-session summary with the given headline numbers.
    pub fn make_summary(player: &str, score: u64, phase: PhaseId, combo: u32) -> SessionSummary {
        SessionSummary {
            session_id: Uuid::new_v4(),
            player_id: player.to_string(),
            final_score: score,
            phase_reached: phase,
            max_combo: combo,
            kicks_total: 0,
            kicks_hit: 0,
            kicks_perfect: 0,
            accuracy: 0,
            duration_secs: 0,
            new_record: false,
        }
    }

    /// A fresh session owned by `player`, started at t=0.
    pub fn make_session(player: &str) -> SessionState {
        SessionState::new(Uuid::new_v4(), player, 0)
    }

    /// Apply a sequence of kicks with default tuning and the seeded phase
    /// table, returning every outcome.
    pub fn apply_kicks(session: &mut SessionState, judgments: &[Judgment]) -> Vec<ActionOutcome> {
        let scoring = ScoringConfig::default();
        let phases = PhaseTable::default();
        judgments
            .iter()
            .map(|&j| {
                session
                    .apply(ActionKind::Kick, j, None, &scoring, &phases, 0)
                    .expect("kick on a live session must apply")
            })
            .collect()
    }
}
