//! Intercept classification: pick the entity a kick is aimed at and judge
//! how close it was to the strike point.

use lanekick_core::judgment::Judgment;

use crate::config::{CaptureShape, StreetConfig};
use crate::lanes::LaneModel;
use crate::spawner::Entity;

/// Result of classifying one kick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub judgment: Judgment,
    /// Index into the entity slice of the entity the kick consumed. Only set
    /// for hit and perfect.
    pub target: Option<usize>,
    /// Distance of the closest eligible entity from the strike point.
    pub distance: Option<f32>,
}

impl Classification {
    fn whiff() -> Self {
        Self {
            judgment: Judgment::Miss,
            target: None,
            distance: None,
        }
    }
}

/// Judge a distance from the ideal interception point.
pub fn judge_distance(distance: f32, config: &StreetConfig) -> Judgment {
    if distance < config.perfect_threshold {
        Judgment::Perfect
    } else if distance < config.hit_threshold {
        Judgment::Hit
    } else {
        Judgment::Miss
    }
}

/// Classify a kick by the player standing in `player_lane`.
pub fn classify(
    entities: &[Entity],
    lanes: &LaneModel,
    player_lane: usize,
    config: &StreetConfig,
) -> Classification {
    let Some(player) = lanes.get(player_lane) else {
        return Classification::whiff();
    };
    let (px, py) = player.point(player.strike);

    let closest = entities
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.hit)
        .filter_map(|(i, e)| {
            let lane = lanes.get(e.lane)?;
            let distance = match config.capture {
                CaptureShape::Lane => {
                    if e.lane != player_lane {
                        return None;
                    }
                    lane.distance_to_strike(e.position)
                },
                CaptureShape::Radius => {
                    let (ex, ey) = lane.point(e.position);
                    (ex - px).hypot(ey - py)
                },
            };
            let window = match config.capture {
                CaptureShape::Lane => config.capture_window,
                CaptureShape::Radius => config.capture_radius,
            };
            (distance <= window).then_some((i, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((index, distance)) = closest else {
        return Classification::whiff();
    };
    let judgment = judge_distance(distance, config);
    Classification {
        judgment,
        target: judgment.is_success().then_some(index),
        distance: Some(distance),
    }
}
