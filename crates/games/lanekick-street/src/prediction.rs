//! Client-side mirror of the session. Local values are predictions for
//! display; every server response overwrites them.

use lanekick_core::judgment::{ActionKind, Judgment};
use lanekick_core::net::messages::{KickRequest, KickResponse, StartResponse};
use lanekick_core::phase::{Phase, PhaseId, PhaseTable};
use lanekick_core::scoring::ScoringConfig;
use lanekick_core::session::{ActionOutcome, SessionId, SessionState};

use crate::SimEvent;

/// Locally predicted copy of a server-owned session.
pub struct PredictedSession {
    session_id: SessionId,
    local: SessionState,
    phases: PhaseTable,
    scoring: ScoringConfig,
}

impl PredictedSession {
    pub fn new(start: &StartResponse) -> Self {
        let mut local = SessionState::new(start.session_id, "", 0);
        local.phase = start.phase;
        Self {
            session_id: start.session_id,
            local,
            phases: start.phases.clone(),
            scoring: ScoringConfig::default(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn score(&self) -> u64 {
        self.local.score
    }

    pub fn combo(&self) -> u32 {
        self.local.combo
    }

    pub fn phase(&self) -> PhaseId {
        self.local.phase
    }

    pub fn phases(&self) -> &PhaseTable {
        &self.phases
    }

    pub fn current_phase(&self) -> &Phase {
        self.phases.get_clamped(self.local.phase)
    }

    /// Apply a judgment locally so the display can update before the server
    /// answers. Returns `None` once the mirror has ended.
    pub fn predict(
        &mut self,
        kind: ActionKind,
        judgment: Judgment,
        archetype: Option<String>,
    ) -> Option<ActionOutcome> {
        self.local
            .apply(kind, judgment, archetype, &self.scoring, &self.phases, 0)
            .ok()
    }

    /// Overwrite the prediction with the authoritative result. Returns the
    /// new phase parameters if the server reports a different phase than the
    /// one the simulation is running.
    pub fn reconcile(&mut self, response: &KickResponse) -> Option<&Phase> {
        let previous = self.local.phase;
        self.local.score = response.total_score;
        self.local.combo = response.combo;
        self.local.max_combo = self.local.max_combo.max(response.combo);
        self.local.phase = response.current_phase;
        if response.current_phase != previous {
            self.phases.get(response.current_phase)
        } else {
            None
        }
    }

    /// Wire request for a judged simulation event, if it is one.
    pub fn request_for(&self, event: &SimEvent) -> Option<KickRequest> {
        let (kind, judgment, archetype) = match event {
            SimEvent::Intercepted {
                judgment,
                archetype,
                ..
            } => (ActionKind::Kick, *judgment, archetype.clone()),
            SimEvent::Dropped { archetype, .. } => {
                (ActionKind::Drop, Judgment::Miss, Some(archetype.clone()))
            },
            SimEvent::Spawned { .. } | SimEvent::Removed { .. } => return None,
        };
        Some(KickRequest {
            session_id: self.session_id.to_string(),
            timing: judgment,
            kind,
            enemy_type: archetype,
        })
    }
}
