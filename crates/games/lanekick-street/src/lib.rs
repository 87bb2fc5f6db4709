pub mod classifier;
pub mod config;
pub mod lanes;
pub mod prediction;
pub mod spawner;

use serde::{Deserialize, Serialize};

use lanekick_core::judgment::Judgment;
use lanekick_core::phase::Phase;

use config::StreetConfig;
use lanes::LaneModel;
use spawner::{Entity, Spawner};

/// Something that happened during a tick. Intercepts and drops are judged
/// actions and go to the server; the rest are for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Spawned {
        entity_id: u64,
        lane: usize,
    },
    /// A kick was classified. `entity_id` is set when it consumed an entity.
    Intercepted {
        entity_id: Option<u64>,
        lane: usize,
        judgment: Judgment,
        archetype: Option<String>,
    },
    /// An entity left the field without being hit.
    Dropped {
        entity_id: u64,
        lane: usize,
        archetype: String,
    },
    /// A hit entity finished its feedback window and left the live set.
    Removed {
        entity_id: u64,
    },
}

/// Kick timing state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KickState {
    /// Seconds left in the kick animation.
    pub animation: f32,
    /// Seconds until another kick is accepted.
    pub cooldown: f32,
    /// A kick requested since the last tick.
    pub pending: bool,
}

impl KickState {
    pub fn is_kicking(&self) -> bool {
        self.animation > 0.0
    }
}

/// One run of the street simulation. All entity mutation happens inside
/// [`StreetRun::tick`].
pub struct StreetRun {
    config: StreetConfig,
    lanes: LaneModel,
    phase: Phase,
    spawner: Spawner,
    entities: Vec<Entity>,
    player_lane: usize,
    kick: KickState,
    paused: bool,
    elapsed: f32,
}

impl StreetRun {
    pub fn new(config: StreetConfig, phase: Phase, seed: u64) -> Self {
        let lanes = LaneModel::from_config(&config);
        let player_lane = lanes.center();
        Self {
            config,
            lanes,
            phase,
            spawner: Spawner::new(seed),
            entities: Vec::new(),
            player_lane,
            kick: KickState::default(),
            paused: false,
            elapsed: 0.0,
        }
    }

    pub fn config(&self) -> &StreetConfig {
        &self.config
    }

    pub fn lanes(&self) -> &LaneModel {
        &self.lanes
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn player_lane(&self) -> usize {
        self.player_lane
    }

    pub fn kick_state(&self) -> &KickState {
        &self.kick
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Switch difficulty for subsequent ticks. Entities already on the field
    /// keep their speed.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn move_left(&mut self) {
        self.player_lane = self.player_lane.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.player_lane + 1 < self.lanes.len() {
            self.player_lane += 1;
        }
    }

    pub fn set_player_lane(&mut self, lane: usize) {
        if lane < self.lanes.len() {
            self.player_lane = lane;
        }
    }

    /// Ask for a kick on the next tick. Returns false while cooling down.
    pub fn request_kick(&mut self) -> bool {
        if self.paused || self.kick.cooldown > 0.0 || self.kick.pending {
            return false;
        }
        self.kick.pending = true;
        true
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if self.paused || dt <= 0.0 {
            return events;
        }
        self.elapsed += dt;

        self.kick.animation = (self.kick.animation - dt).max(0.0);
        self.kick.cooldown = (self.kick.cooldown - dt).max(0.0);
        if self.kick.pending {
            self.kick.pending = false;
            self.kick.animation = self.config.kick_duration;
            self.kick.cooldown = self.config.kick_cooldown;
            events.push(self.resolve_kick());
        }

        let first_new = self.entities.len();
        self.spawner.tick(
            dt,
            &self.phase,
            &self.lanes,
            &self.config,
            &mut self.entities,
        );
        events.extend(self.entities[first_new..].iter().map(|e| SimEvent::Spawned {
            entity_id: e.id,
            lane: e.lane,
        }));

        for entity in &mut self.entities {
            if entity.hit {
                entity.hit_timer += dt;
            } else {
                entity.position += entity.velocity * dt;
            }
        }

        self.retire(&mut events);
        events
    }

    fn resolve_kick(&mut self) -> SimEvent {
        let c = classifier::classify(&self.entities, &self.lanes, self.player_lane, &self.config);
        let target = c.target.and_then(|i| self.entities.get_mut(i));
        match target {
            Some(entity) => {
                entity.hit = true;
                entity.hit_timer = 0.0;
                SimEvent::Intercepted {
                    entity_id: Some(entity.id),
                    lane: entity.lane,
                    judgment: c.judgment,
                    archetype: Some(entity.archetype.clone()),
                }
            },
            None => SimEvent::Intercepted {
                entity_id: None,
                lane: self.player_lane,
                judgment: c.judgment,
                archetype: None,
            },
        }
    }

    /// Remove exited and spent entities. Each entity leaves the live set
    /// exactly once, so a drop can never be reported twice.
    fn retire(&mut self, events: &mut Vec<SimEvent>) {
        let lanes = &self.lanes;
        let feedback = self.config.hit_feedback_duration;
        self.entities.retain(|e| {
            if e.hit {
                if e.hit_timer >= feedback {
                    events.push(SimEvent::Removed { entity_id: e.id });
                    return false;
                }
                return true;
            }
            let exited = lanes.get(e.lane).is_none_or(|lane| lane.has_exited(e.position));
            if exited {
                events.push(SimEvent::Dropped {
                    entity_id: e.id,
                    lane: e.lane,
                    archetype: e.archetype.clone(),
                });
            }
            !exited
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanekick_core::phase::PhaseTable;
    use spawner::WeightClass;

    fn run() -> StreetRun {
        StreetRun::new(StreetConfig::default(), PhaseTable::default().first().clone(), 11)
    }

    fn place(run: &mut StreetRun, id: u64, lane: usize, position: f32) {
        run.entities.push(Entity {
            id,
            lane,
            position,
            velocity: 0.0,
            archetype: "biker".into(),
            weight: WeightClass::Light,
            hit: false,
            hit_timer: 0.0,
        });
    }

    fn drops(events: &[SimEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimEvent::Dropped { .. }))
            .count()
    }

    #[test]
    fn player_starts_centered_and_moves_within_bounds() {
        let mut r = run();
        assert_eq!(r.player_lane(), 2);
        for _ in 0..10 {
            r.move_left();
        }
        assert_eq!(r.player_lane(), 0);
        for _ in 0..10 {
            r.move_right();
        }
        assert_eq!(r.player_lane(), 4);
        r.set_player_lane(9);
        assert_eq!(r.player_lane(), 4);
    }

    #[test]
    fn kick_resolves_on_tick_and_consumes_one_entity() {
        let mut r = run();
        place(&mut r, 100, 2, 550.0);
        place(&mut r, 101, 2, 555.0);
        assert!(r.request_kick());
        assert!(r.entities().iter().all(|e| !e.hit));

        let events = r.tick(0.01);
        let hits: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Intercepted {
                    entity_id: Some(id),
                    judgment,
                    ..
                } => Some((*id, *judgment)),
                _ => None,
            })
            .collect();
        assert_eq!(hits, vec![(100, Judgment::Perfect)]);
        assert_eq!(r.entities().iter().filter(|e| e.hit).count(), 1);
    }

    #[test]
    fn cooldown_blocks_rapid_kicks() {
        let mut r = run();
        assert!(r.request_kick());
        assert!(!r.request_kick());
        r.tick(0.1);
        assert!(r.kick_state().is_kicking());
        assert!(!r.request_kick());
        r.tick(0.5);
        assert!(r.request_kick());
    }

    #[test]
    fn whiff_is_reported_as_miss() {
        let mut r = run();
        r.request_kick();
        let events = r.tick(0.01);
        assert!(events.contains(&SimEvent::Intercepted {
            entity_id: None,
            lane: 2,
            judgment: Judgment::Miss,
            archetype: None,
        }));
    }

    #[test]
    fn exited_entity_drops_exactly_once() {
        let mut r = run();
        place(&mut r, 7, 0, 699.0);
        r.entities[0].velocity = 200.0;
        let mut total = 0;
        for _ in 0..20 {
            total += drops(&r.tick(0.05));
        }
        assert_eq!(total, 1);
        assert!(r.entities().iter().all(|e| e.id != 7));
    }

    #[test]
    fn hit_entity_is_removed_after_feedback_and_never_drops() {
        let mut r = run();
        place(&mut r, 9, 2, 550.0);
        r.entities[0].velocity = 10_000.0;
        r.request_kick();
        let mut saw_removed = false;
        let mut dropped = 0;
        for _ in 0..10 {
            let events = r.tick(0.05);
            dropped += drops(&events);
            saw_removed |= events.contains(&SimEvent::Removed { entity_id: 9 });
        }
        assert!(saw_removed);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn paused_run_does_not_advance() {
        let mut r = run();
        place(&mut r, 1, 0, 10.0);
        r.entities[0].velocity = 100.0;
        r.pause();
        assert!(!r.request_kick());
        assert!(r.tick(1.0).is_empty());
        assert!((r.entities()[0].position - 10.0).abs() < f32::EPSILON);
        r.resume();
        r.tick(1.0);
        assert!(r.entities()[0].position > 10.0);
    }

    #[test]
    fn phase_change_speeds_up_new_spawns() {
        let table = PhaseTable::default();
        let mut r = StreetRun::new(StreetConfig::default(), table.first().clone(), 5);
        let base_speed = |r: &StreetRun| {
            let e = r.entities().last().unwrap();
            e.velocity.abs() / e.weight.speed_multiplier(r.config())
        };
        r.tick(2.0);
        let slow = base_speed(&r);
        r.set_phase(table.get(6).unwrap().clone());
        r.tick(2.0);
        assert!(base_speed(&r) > slow);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            #[test]
            fn every_entity_leaves_at_most_once(
                seed in any::<u64>(),
                kicks in proptest::collection::vec(any::<bool>(), 50..300),
                lane_moves in proptest::collection::vec(0usize..5, 50..300),
            ) {
                let table = PhaseTable::default();
                let mut r = StreetRun::new(StreetConfig::default(), table.get(6).unwrap().clone(), seed);
                let mut left = HashSet::new();
                let mut consumed = HashSet::new();
                for (kick, lane) in kicks.iter().zip(lane_moves.iter()) {
                    r.set_player_lane(*lane);
                    if *kick {
                        r.request_kick();
                    }
                    for event in r.tick(1.0 / 30.0) {
                        match event {
                            SimEvent::Dropped { entity_id, .. } | SimEvent::Removed { entity_id } => {
                                prop_assert!(left.insert(entity_id), "entity {} left twice", entity_id);
                            },
                            SimEvent::Intercepted { entity_id: Some(id), judgment, .. } => {
                                prop_assert!(judgment.is_success());
                                prop_assert!(consumed.insert(id), "entity {} consumed twice", id);
                            },
                            _ => {},
                        }
                    }
                }
                for id in &consumed {
                    prop_assert!(!r.entities().iter().any(|e| e.id == *id && !e.hit));
                }
            }
        }
    }
}
