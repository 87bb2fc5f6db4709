use serde::{Deserialize, Serialize};

use crate::judgment::{ActionKind, Judgment};
use crate::phase::{PhaseId, PhaseTable};
use crate::session::{ActionOutcome, ReportedStats, SessionId, SessionSummary};

/// Response to `POST /game/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: SessionId,
    pub phase: PhaseId,
    pub phases: PhaseTable,
}

/// Body of `POST /game/kick`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KickRequest {
    pub session_id: String,
    pub timing: Judgment,
    #[serde(default)]
    pub kind: ActionKind,
    #[serde(default)]
    pub enemy_type: Option<String>,
}

/// Authoritative result of one judged action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickResponse {
    pub result: Judgment,
    pub points_earned: u64,
    pub total_score: u64,
    pub combo: u32,
    pub combo_break: bool,
    pub phase_up: bool,
    pub current_phase: PhaseId,
}

impl From<&ActionOutcome> for KickResponse {
    fn from(out: &ActionOutcome) -> Self {
        Self {
            result: out.judgment,
            points_earned: out.points,
            total_score: out.score,
            combo: out.combo,
            combo_break: out.combo_break,
            phase_up: out.phase_up,
            current_phase: out.phase,
        }
    }
}

/// Body of `POST /game/end`. The stats are the client's own tally and are
/// only consulted when the server no longer holds the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub reported: ReportedStats,
}

/// Response to `POST /game/end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndResponse {
    pub final_score: u64,
    pub phase_reached: PhaseId,
    pub max_combo: u32,
    pub kicks_total: u64,
    pub kicks_hit: u64,
    pub accuracy: u32,
    pub new_record: bool,
    /// True when nothing was finalized or credited by this call.
    pub no_op: bool,
}

impl EndResponse {
    pub fn from_summary(summary: &SessionSummary, no_op: bool) -> Self {
        Self {
            final_score: summary.final_score,
            phase_reached: summary.phase_reached,
            max_combo: summary.max_combo,
            kicks_total: summary.kicks_total,
            kicks_hit: summary.kicks_hit,
            accuracy: summary.accuracy,
            new_record: summary.new_record,
            no_op,
        }
    }

    /// Echo of client stats for a session the server has never seen.
    pub fn echo(reported: &ReportedStats) -> Self {
        let accuracy = if reported.kicks_total > 0 {
            ((reported.kicks_hit as f64 / reported.kicks_total as f64) * 100.0).round() as u32
        } else {
            0
        };
        Self {
            final_score: reported.score,
            phase_reached: reported.phase.max(1),
            max_combo: reported.combo,
            kicks_total: reported.kicks_total,
            kicks_hit: reported.kicks_hit,
            accuracy,
            new_record: false,
            no_op: true,
        }
    }
}
