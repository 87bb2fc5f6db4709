use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::judgment::{ActionKind, Judgment};
use crate::phase::{PhaseId, PhaseTable};
use crate::player::PlayerId;
use crate::progression;
use crate::scoring::ScoringConfig;

pub type SessionId = Uuid;

/// Lifecycle of one play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Row exists, no judged actions yet.
    Created,
    /// At least one judged action applied.
    Active,
    /// Terminal. Score, combo and phase are frozen.
    Ended,
}

/// Intercept counters. Drops are not attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KickStats {
    pub total: u64,
    pub hit: u64,
    pub perfect: u64,
}

impl KickStats {
    /// Hits over attempts as a rounded percentage.
    pub fn accuracy(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.hit as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Rejections raised by the state machine. No state is mutated when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session has already ended.
    Ended,
    /// The session belongs to a different player.
    NotOwner,
    /// A drop carried a judgment other than miss.
    InvalidDrop(Judgment),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ended => write!(f, "session has ended"),
            Self::NotOwner => write!(f, "session belongs to another player"),
            Self::InvalidDrop(j) => write!(f, "drop must be judged miss, got {j}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Immutable record of one judged action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub session_id: SessionId,
    pub kind: ActionKind,
    pub judgment: Judgment,
    pub archetype: Option<String>,
    pub points: u64,
    pub combo: u32,
    pub timestamp: u64,
}

/// What one judged action did to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub judgment: Judgment,
    pub points: u64,
    pub score: u64,
    pub combo: u32,
    pub combo_break: bool,
    pub phase_up: bool,
    pub phase: PhaseId,
    pub record: ActionRecord,
}

/// Final numbers for an ended session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub final_score: u64,
    pub phase_reached: PhaseId,
    pub max_combo: u32,
    pub kicks_total: u64,
    pub kicks_hit: u64,
    pub kicks_perfect: u64,
    pub accuracy: u32,
    pub duration_secs: u64,
    pub new_record: bool,
}

/// Client-reported totals, used only when the authoritative copy is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportedStats {
    pub score: u64,
    pub phase: PhaseId,
    pub combo: u32,
    pub kicks_total: u64,
    pub kicks_hit: u64,
}

/// Authoritative state of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub status: SessionStatus,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub phase: PhaseId,
    pub kicks: KickStats,
    pub started_at: u64,
    pub ended_at: Option<u64>,
    pub new_record: bool,
}

impl SessionState {
    pub fn new(id: SessionId, player_id: impl Into<PlayerId>, now: u64) -> Self {
        Self {
            id,
            player_id: player_id.into(),
            status: SessionStatus::Created,
            score: 0,
            combo: 0,
            max_combo: 0,
            phase: 1,
            kicks: KickStats::default(),
            started_at: now,
            ended_at: None,
            new_record: false,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.status == SessionStatus::Ended
    }

    pub fn check_owner(&self, player_id: &str) -> Result<(), SessionError> {
        if self.player_id == player_id {
            Ok(())
        } else {
            Err(SessionError::NotOwner)
        }
    }

    /// Apply one judged action: score it, update the combo, then check for a
    /// phase advance.
    pub fn apply(
        &mut self,
        kind: ActionKind,
        judgment: Judgment,
        archetype: Option<String>,
        scoring: &ScoringConfig,
        phases: &PhaseTable,
        now: u64,
    ) -> Result<ActionOutcome, SessionError> {
        if self.is_ended() {
            return Err(SessionError::Ended);
        }
        if kind == ActionKind::Drop && judgment != Judgment::Miss {
            return Err(SessionError::InvalidDrop(judgment));
        }

        let multiplier = phases.get_clamped(self.phase).points_multiplier;
        let scored = scoring.score(judgment, self.combo, multiplier);
        let combo_break = !judgment.is_success() && self.combo > 0;

        if kind == ActionKind::Kick {
            self.kicks.total += 1;
        }
        match judgment {
            Judgment::Miss => {},
            Judgment::Hit => self.kicks.hit += 1,
            Judgment::Perfect => {
                self.kicks.hit += 1;
                self.kicks.perfect += 1;
            },
        }

        self.status = SessionStatus::Active;
        self.combo = scored.combo;
        self.max_combo = self.max_combo.max(scored.combo);
        self.score = self.score.saturating_add(scored.points);

        let advance = progression::advance(self.score, self.phase, phases);
        self.phase = advance.phase;

        Ok(ActionOutcome {
            judgment,
            points: scored.points,
            score: self.score,
            combo: self.combo,
            combo_break,
            phase_up: advance.phase_up,
            phase: self.phase,
            record: ActionRecord {
                session_id: self.id,
                kind,
                judgment,
                archetype,
                points: scored.points,
                combo: scored.combo,
                timestamp: now,
            },
        })
    }

    /// Transition to `Ended`. Errors if already ended, leaving state intact.
    pub fn end(&mut self, now: u64) -> Result<SessionSummary, SessionError> {
        if self.is_ended() {
            return Err(SessionError::Ended);
        }
        self.status = SessionStatus::Ended;
        self.ended_at = Some(now.max(self.started_at));
        Ok(self.summary())
    }

    /// End a session whose authoritative in-memory copy was lost, trusting
    /// the client's totals where they exceed what was last persisted.
    pub fn end_with_reported(
        &mut self,
        reported: &ReportedStats,
        phases: &PhaseTable,
        now: u64,
    ) -> Result<SessionSummary, SessionError> {
        if self.is_ended() {
            return Err(SessionError::Ended);
        }
        self.score = self.score.max(reported.score);
        self.phase = self.phase.max(reported.phase).clamp(1, phases.last_id());
        self.max_combo = self.max_combo.max(reported.combo);
        if reported.kicks_total >= reported.kicks_hit && reported.kicks_total > self.kicks.total {
            self.kicks.total = reported.kicks_total;
            self.kicks.hit = reported.kicks_hit;
            self.kicks.perfect = self.kicks.perfect.min(reported.kicks_hit);
        }
        self.end(now)
    }

    pub fn summary(&self) -> SessionSummary {
        let ended = self.ended_at.unwrap_or(self.started_at);
        SessionSummary {
            session_id: self.id,
            player_id: self.player_id.clone(),
            final_score: self.score,
            phase_reached: self.phase,
            max_combo: self.max_combo,
            kicks_total: self.kicks.total,
            kicks_hit: self.kicks.hit,
            kicks_perfect: self.kicks.perfect,
            accuracy: self.kicks.accuracy(),
            duration_secs: ended.saturating_sub(self.started_at),
            new_record: self.new_record,
        }
    }
}
