use serde::{Deserialize, Serialize};

/// How lanes are arranged on the play field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneLayout {
    /// `lane_count` parallel lanes; entities travel top to bottom.
    Vertical,
    /// Two horizontal lanes approaching the player from opposite sides.
    Opposing,
}

/// How the classifier finds the entity an intercept is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureShape {
    /// Same lane as the player, within `capture_window` of the strike point.
    Lane,
    /// Any lane, within `capture_radius` of the player's strike point.
    Radius,
}

/// Data-driven configuration for the street simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetConfig {
    pub layout: LaneLayout,
    /// Number of lanes for the vertical layout. The opposing layout always has two.
    pub lane_count: usize,
    /// Play-field width (units).
    pub field_width: f32,
    /// Play-field height (units).
    pub field_height: f32,
    /// Distance beyond the near edge where entities appear.
    pub spawn_offset: f32,
    /// Distance of the strike point from the far edge (vertical layout).
    pub strike_offset: f32,
    /// Distance of each strike point from the field center (opposing layout).
    pub opposing_strike_gap: f32,
    pub capture: CaptureShape,
    /// Lane-mode capture window around the strike point.
    pub capture_window: f32,
    /// Radius-mode capture radius around the strike point.
    pub capture_radius: f32,
    /// Distances strictly below this are perfect.
    pub perfect_threshold: f32,
    /// Distances strictly below this (and not perfect) are hits.
    pub hit_threshold: f32,
    /// Enemy speed at a phase speed multiplier of 1.0 (units/s).
    pub base_speed: f32,
    pub light_speed_multiplier: f32,
    pub heavy_speed_multiplier: f32,
    /// Probability that a spawned entity is heavy.
    pub heavy_chance: f64,
    /// Seconds between spawns at a phase spawn rate of 1.0.
    pub base_spawn_interval: f32,
    /// Spawn interval floor (seconds).
    pub min_spawn_interval: f32,
    /// Upper bound on entities per spawn batch.
    pub max_spawn_batch: usize,
    /// Kick animation length (seconds).
    pub kick_duration: f32,
    /// Minimum time between kicks (seconds).
    pub kick_cooldown: f32,
    /// How long a hit entity stays visible before removal (seconds).
    pub hit_feedback_duration: f32,
}

impl Default for StreetConfig {
    fn default() -> Self {
        Self {
            layout: LaneLayout::Vertical,
            lane_count: 5,
            field_width: 400.0,
            field_height: 700.0,
            spawn_offset: 100.0,
            strike_offset: 150.0,
            opposing_strike_gap: 40.0,
            capture: CaptureShape::Lane,
            capture_window: 80.0,
            capture_radius: 80.0,
            perfect_threshold: 20.0,
            hit_threshold: 50.0,
            base_speed: 138.0,
            light_speed_multiplier: 1.1,
            heavy_speed_multiplier: 0.8,
            heavy_chance: 0.5,
            base_spawn_interval: 1.5,
            min_spawn_interval: 0.6,
            max_spawn_batch: 3,
            kick_duration: 0.2,
            kick_cooldown: 0.4,
            hit_feedback_duration: 0.25,
        }
    }
}

impl StreetConfig {
    /// Load config from `LANEKICK_STREET_CONFIG`, else `config/street.toml`,
    /// falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("LANEKICK_STREET_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "config/street.toml".to_string());
        Self::from_path(&path)
    }

    /// Read one TOML file. A missing or invalid file yields the defaults.
    pub fn from_path(path: &str) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            tracing::debug!(path = %path, "No street config found, using defaults");
            return Self::default();
        };
        match toml::from_str::<Self>(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Invalid street config, using defaults");
                Self::default()
            },
        }
    }

    /// Number of lanes the configured layout produces.
    pub fn effective_lane_count(&self) -> usize {
        match self.layout {
            LaneLayout::Vertical => self.lane_count.max(1),
            LaneLayout::Opposing => 2,
        }
    }
}
