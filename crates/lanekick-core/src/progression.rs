use serde::{Deserialize, Serialize};

use crate::phase::{PhaseId, PhaseTable};

/// Outcome of one progression check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseAdvance {
    pub phase: PhaseId,
    pub phase_up: bool,
}

/// Decide whether a session at `current` advances given its cumulative score.
///
/// Advances at most one phase per call even when the score clears several
/// thresholds at once. The last configured phase is terminal.
pub fn advance(score: u64, current: PhaseId, table: &PhaseTable) -> PhaseAdvance {
    let current = current.clamp(1, table.last_id());
    match table.get(current + 1) {
        Some(next) if score >= next.required_score => PhaseAdvance {
            phase: next.id,
            phase_up: true,
        },
        _ => PhaseAdvance {
            phase: current,
            phase_up: false,
        },
    }
}

/// Highest phase whose threshold `score` has reached. Used only where a
/// phase must be derived from a score with no step history, e.g. when
/// validating client-reported end stats.
pub fn highest_reachable(score: u64, table: &PhaseTable) -> PhaseId {
    table
        .phases()
        .iter()
        .rev()
        .find(|p| score >= p.required_score)
        .map(|p| p.id)
        .unwrap_or(1)
}
