use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{clamp_min, clamp_range, ConfigError, Sanitize, Validate};
use crate::simulation::Direction;

pub const MAX_TICK_RATE: f32 = 1000.0;
/// Longest a single phase may last, in seconds.
pub const MAX_PHASE_DURATION: f32 = 3600.0;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IntersectionConfig {
    pub name: String,
    /// Simulation ticks per second; signal durations are converted with this rate.
    pub tick_rate: f32,
    /// Approaches that carry traffic. Each one is a single axis-aligned lane.
    pub lanes: Vec<Direction>,
    pub geometry: Geometry,
    pub signal: SignalConfig,
}

/// Lane-coordinate geometry shared by every approach. All values are
/// distances from the intersection center, in meters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Geometry {
    pub half_width: f32,
    pub stop_line_offset: f32,
    pub world_extent: f32,
    pub lane_offset: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalConfig {
    pub green_duration: f32,
    pub yellow_duration: f32,
    pub all_red_duration: f32,
    pub manual: bool,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            name: "Main St / Cross Rd".to_string(),
            tick_rate: 30.0,
            lanes: Direction::ALL.to_vec(),
            geometry: Geometry::default(),
            signal: SignalConfig::default(),
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            half_width: 7.0,
            stop_line_offset: 9.0,
            world_extent: 120.0,
            lane_offset: 1.75,
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            green_duration: 5.0,
            yellow_duration: 2.0,
            all_red_duration: 1.0,
            manual: false,
        }
    }
}

impl Geometry {
    /// Lane position of the stop line on every approach.
    pub fn stop_line(&self) -> f32 {
        -self.stop_line_offset
    }
}

impl Validate for IntersectionConfig {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for lane in &self.lanes {
            if !seen.insert(*lane) {
                return Err(ConfigError::DuplicateLane(*lane).into());
            }
        }
        Ok(())
    }
}

impl Sanitize for IntersectionConfig {
    fn sanitize(&mut self) {
        self.tick_rate = clamp_range("tick_rate", self.tick_rate, 1.0, MAX_TICK_RATE);

        let geometry = &mut self.geometry;
        geometry.half_width = clamp_min("geometry.half_width", geometry.half_width, 1.0);
        geometry.stop_line_offset =
            clamp_min("geometry.stop_line_offset", geometry.stop_line_offset, geometry.half_width);
        geometry.world_extent = clamp_min(
            "geometry.world_extent",
            geometry.world_extent,
            geometry.stop_line_offset + 10.0,
        );
        geometry.lane_offset = clamp_min("geometry.lane_offset", geometry.lane_offset, 0.0);

        let signal = &mut self.signal;
        signal.green_duration =
            clamp_range("signal.green_duration", signal.green_duration, 0.0, MAX_PHASE_DURATION);
        signal.yellow_duration =
            clamp_range("signal.yellow_duration", signal.yellow_duration, 0.0, MAX_PHASE_DURATION);
        signal.all_red_duration =
            clamp_range("signal.all_red_duration", signal.all_red_duration, 0.0, MAX_PHASE_DURATION);
    }
}
