use serde::{Deserialize, Serialize};

use crate::config::{LaneLayout, StreetConfig};

/// Axis entities travel along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// One lane. Positions along the lane are scalar coordinates on `axis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub index: usize,
    pub axis: Axis,
    /// Screen coordinate perpendicular to the axis (lane center).
    pub cross: f32,
    /// Where entities appear.
    pub origin: f32,
    /// Far boundary; crossing it unhandled is a drop.
    pub exit: f32,
    /// +1.0 or -1.0.
    pub direction: f32,
    /// Ideal interception point.
    pub strike: f32,
}

impl Lane {
    /// Screen-space point for a position on this lane.
    pub fn point(&self, position: f32) -> (f32, f32) {
        match self.axis {
            Axis::Vertical => (self.cross, position),
            Axis::Horizontal => (position, self.cross),
        }
    }

    pub fn has_exited(&self, position: f32) -> bool {
        if self.direction > 0.0 {
            position >= self.exit
        } else {
            position <= self.exit
        }
    }

    pub fn distance_to_strike(&self, position: f32) -> f32 {
        (position - self.strike).abs()
    }
}

/// Static lane geometry for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneModel {
    lanes: Vec<Lane>,
}

impl LaneModel {
    pub fn from_config(config: &StreetConfig) -> Self {
        match config.layout {
            LaneLayout::Vertical => Self::vertical(config),
            LaneLayout::Opposing => Self::opposing(config),
        }
    }

    fn vertical(config: &StreetConfig) -> Self {
        let count = config.effective_lane_count();
        let lane_width = config.field_width / count as f32;
        let lanes = (0..count)
            .map(|i| Lane {
                index: i,
                axis: Axis::Vertical,
                cross: lane_width * i as f32 + lane_width / 2.0,
                origin: -config.spawn_offset,
                exit: config.field_height,
                direction: 1.0,
                strike: config.field_height - config.strike_offset,
            })
            .collect();
        Self { lanes }
    }

    fn opposing(config: &StreetConfig) -> Self {
        let center = config.field_width / 2.0;
        let row = config.field_height / 2.0;
        let lanes = vec![
            Lane {
                index: 0,
                axis: Axis::Horizontal,
                cross: row,
                origin: -config.spawn_offset,
                exit: config.field_width,
                direction: 1.0,
                strike: center - config.opposing_strike_gap,
            },
            Lane {
                index: 1,
                axis: Axis::Horizontal,
                cross: row,
                origin: config.field_width + config.spawn_offset,
                exit: 0.0,
                direction: -1.0,
                strike: center + config.opposing_strike_gap,
            },
        ];
        Self { lanes }
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    /// Center lane, where the player starts.
    pub fn center(&self) -> usize {
        self.lanes.len() / 2
    }
}
