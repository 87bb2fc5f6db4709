use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use lanekick_core::phase::Phase;

use crate::config::StreetConfig;
use crate::lanes::LaneModel;

/// Archetype used if a phase somehow lists none.
pub const FALLBACK_ARCHETYPE: &str = "biker";

/// Weight class of a spawned enemy. Heavier is slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightClass {
    Light,
    Heavy,
}

impl WeightClass {
    pub fn speed_multiplier(self, config: &StreetConfig) -> f32 {
        match self {
            WeightClass::Light => config.light_speed_multiplier,
            WeightClass::Heavy => config.heavy_speed_multiplier,
        }
    }
}

/// A live enemy on the field. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
    pub lane: usize,
    pub position: f32,
    /// Signed units/s along the lane axis.
    pub velocity: f32,
    pub archetype: String,
    pub weight: WeightClass,
    pub hit: bool,
    /// Seconds since the entity was hit.
    pub hit_timer: f32,
}

/// Emits spawn batches on a phase-derived cadence.
pub struct Spawner {
    rng: StdRng,
    timer: f32,
    next_id: u64,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            timer: 0.0,
            next_id: 1,
        }
    }

    /// Seconds between batches for `phase`. Shrinks as the spawn rate grows,
    /// never below the configured floor.
    pub fn spawn_interval(phase: &Phase, config: &StreetConfig) -> f32 {
        (config.base_spawn_interval / phase.spawn_rate.max(f64::EPSILON) as f32)
            .max(config.min_spawn_interval)
    }

    /// Largest batch allowed for `phase`, bounded by the lane count so each
    /// entity in a batch gets its own lane.
    pub fn max_batch(phase: &Phase, config: &StreetConfig, lane_count: usize) -> usize {
        (1 + phase.id as usize / 2)
            .min(config.max_spawn_batch)
            .min(lane_count)
            .max(1)
    }

    /// Advance the spawn timer by `dt` and append any new entities to `out`.
    /// Returns how many were spawned this tick.
    pub fn tick(
        &mut self,
        dt: f32,
        phase: &Phase,
        lanes: &LaneModel,
        config: &StreetConfig,
        out: &mut Vec<Entity>,
    ) -> usize {
        if lanes.is_empty() {
            return 0;
        }
        let interval = Self::spawn_interval(phase, config);
        self.timer += dt;
        if self.timer < interval {
            return 0;
        }
        // Carry the overshoot; one batch per tick, so cap the backlog.
        self.timer = (self.timer - interval).min(interval);
        self.spawn_batch(phase, lanes, config, out)
    }

    fn spawn_batch(
        &mut self,
        phase: &Phase,
        lanes: &LaneModel,
        config: &StreetConfig,
        out: &mut Vec<Entity>,
    ) -> usize {
        let max = Self::max_batch(phase, config, lanes.len());
        let count = self.rng.random_range(1..=max);
        let picked = rand::seq::index::sample(&mut self.rng, lanes.len(), count);

        for lane_idx in picked.iter() {
            let Some(lane) = lanes.get(lane_idx) else {
                continue;
            };
            let weight = if self.rng.random_bool(config.heavy_chance.clamp(0.0, 1.0)) {
                WeightClass::Heavy
            } else {
                WeightClass::Light
            };
            let archetype = phase
                .enemy_types
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_else(|| FALLBACK_ARCHETYPE.to_string());
            let speed =
                config.base_speed * phase.speed_multiplier as f32 * weight.speed_multiplier(config);

            out.push(Entity {
                id: self.next_id,
                lane: lane_idx,
                position: lane.origin,
                velocity: lane.direction * speed,
                archetype,
                weight,
                hit: false,
                hit_timer: 0.0,
            });
            self.next_id += 1;
        }
        count
    }
}
