use serde::{Deserialize, Serialize};

use crate::judgment::Judgment;

/// Base points for a hit.
pub const HIT_BASE_POINTS: u64 = 100;
/// Combo bonus per combo step on a hit.
pub const HIT_COMBO_STEP: u64 = 10;
/// Maximum combo bonus on a hit.
pub const HIT_COMBO_CAP: u64 = 200;
/// Base points for a perfect.
pub const PERFECT_BASE_POINTS: u64 = 200;
/// Combo bonus per combo step on a perfect.
pub const PERFECT_COMBO_STEP: u64 = 20;
/// Maximum combo bonus on a perfect.
pub const PERFECT_COMBO_CAP: u64 = 400;

/// Tuning values for the scoring engine. Every scoring call site reads from
/// one of these rather than repeating constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub hit_base: u64,
    pub hit_combo_step: u64,
    pub hit_combo_cap: u64,
    pub perfect_base: u64,
    pub perfect_combo_step: u64,
    pub perfect_combo_cap: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hit_base: HIT_BASE_POINTS,
            hit_combo_step: HIT_COMBO_STEP,
            hit_combo_cap: HIT_COMBO_CAP,
            perfect_base: PERFECT_BASE_POINTS,
            perfect_combo_step: PERFECT_COMBO_STEP,
            perfect_combo_cap: PERFECT_COMBO_CAP,
        }
    }
}

/// Result of scoring one judged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub points: u64,
    pub combo: u32,
}

impl ScoringConfig {
    /// Score a judgment given the combo before it and the current phase's
    /// points multiplier.
    ///
    /// The combo bonus uses the combo value *after* the increment and is
    /// capped; the combo counter itself is not.
    pub fn score(&self, judgment: Judgment, combo: u32, multiplier: f64) -> ScoreOutcome {
        let (base, step, cap) = match judgment {
            Judgment::Miss => return ScoreOutcome { points: 0, combo: 0 },
            Judgment::Hit => (self.hit_base, self.hit_combo_step, self.hit_combo_cap),
            Judgment::Perfect => (
                self.perfect_base,
                self.perfect_combo_step,
                self.perfect_combo_cap,
            ),
        };
        let combo = combo.saturating_add(1);
        let bonus = u64::from(combo).saturating_mul(step).min(cap);
        let raw = base.saturating_add(bonus) as f64 * multiplier;
        ScoreOutcome {
            points: raw.floor().max(0.0) as u64,
            combo,
        }
    }
}
