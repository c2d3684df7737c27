use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{clamp_min, clamp_range, ConfigError, Sanitize, Validate};
use crate::simulation::VehicleClass;

pub const MIN_GAP_FLOOR: f32 = 0.5;
pub const BUFFER_FLOOR: f32 = 0.1;
pub const MIN_CRUISE_SPEED: f32 = 0.5;
pub const MAX_CRUISE_SPEED: f32 = 60.0;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VehiclesConfig {
    pub traffic: TrafficConfig,
    pub following: FollowingConfig,
    pub signal_response: SignalResponse,
    pub classes: Vec<ClassSpec>,
    pub random: RandomConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Expected arrivals per second on each lane.
    pub spawn_rate: f32,
    pub max_per_lane: u32,
    /// Length of the zone past the entry point that must be empty before a spawn.
    pub entry_clearance: f32,
    pub cruise_speed: f32,
    /// Relative half-width of the cruise speed band.
    pub cruise_spread: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FollowingConfig {
    pub min_gap: f32,
    pub buffer: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalResponse {
    pub braking_trigger: f32,
    pub commit_distance: f32,
    pub late_stop_distance: f32,
    /// Distance kept between the front bumper and the stop line when held.
    pub stop_buffer: f32,
    pub yellow_policy: YellowPolicy,
}

/// How an approaching vehicle treats a yellow light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YellowPolicy {
    /// Vehicles within the committed distance continue, the rest stop inside the late-stop band.
    #[default]
    LateClear,
    /// Yellow is handled exactly like red.
    AlwaysStop,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassSpec {
    pub class: VehicleClass,
    pub weight: u32,
    pub length: f32,
    pub width: f32,
    pub acceleration: f32,
    pub deceleration: f32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PerformanceConfig {
    pub timing_samples: u32,
}

impl Default for VehiclesConfig {
    fn default() -> Self {
        Self {
            traffic: TrafficConfig::default(),
            following: FollowingConfig::default(),
            signal_response: SignalResponse::default(),
            classes: VehicleClass::ALL.iter().map(|&class| ClassSpec::for_class(class)).collect(),
            random: RandomConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 0.4,
            max_per_lane: 8,
            entry_clearance: 16.0,
            cruise_speed: 12.0,
            cruise_spread: 0.2,
        }
    }
}

impl Default for FollowingConfig {
    fn default() -> Self {
        Self {
            min_gap: 2.0,
            buffer: 10.0,
        }
    }
}

impl Default for SignalResponse {
    fn default() -> Self {
        Self {
            braking_trigger: 60.0,
            commit_distance: 8.0,
            late_stop_distance: 40.0,
            stop_buffer: 1.0,
            yellow_policy: YellowPolicy::LateClear,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { timing_samples: 120 }
    }
}

impl ClassSpec {
    /// Built-in footprint and dynamics for a class.
    pub fn for_class(class: VehicleClass) -> Self {
        let (weight, length, width, acceleration, deceleration) = match class {
            VehicleClass::Car => (70, 4.5, 1.8, 2.5, 4.5),
            VehicleClass::Taxi => (15, 4.7, 1.8, 2.5, 4.5),
            VehicleClass::Truck => (8, 8.0, 2.5, 1.2, 3.0),
            VehicleClass::Bus => (7, 12.0, 2.5, 1.0, 3.0),
        };
        Self {
            class,
            weight,
            length,
            width,
            acceleration,
            deceleration,
        }
    }
}

impl VehiclesConfig {
    pub fn class_spec(&self, class: VehicleClass) -> ClassSpec {
        self.classes
            .iter()
            .find(|spec| spec.class == class)
            .cloned()
            .unwrap_or_else(|| ClassSpec::for_class(class))
    }
}

impl Validate for VehiclesConfig {
    fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(ConfigError::NoVehicleClasses.into());
        }

        let total_weight: u32 = self.classes.iter().map(|spec| spec.weight).sum();
        if total_weight == 0 {
            return Err(ConfigError::ZeroClassWeight.into());
        }

        let mut seen = HashSet::new();
        for spec in &self.classes {
            if !seen.insert(spec.class) {
                return Err(ConfigError::DuplicateClass(spec.class).into());
            }
        }

        Ok(())
    }
}

impl Sanitize for VehiclesConfig {
    fn sanitize(&mut self) {
        let traffic = &mut self.traffic;
        traffic.spawn_rate = clamp_min("traffic.spawn_rate", traffic.spawn_rate, 0.0);
        traffic.cruise_speed = clamp_range(
            "traffic.cruise_speed",
            traffic.cruise_speed,
            MIN_CRUISE_SPEED,
            MAX_CRUISE_SPEED,
        );
        traffic.cruise_spread = clamp_range("traffic.cruise_spread", traffic.cruise_spread, 0.0, 0.9);

        let following = &mut self.following;
        following.min_gap = clamp_min("following.min_gap", following.min_gap, MIN_GAP_FLOOR);
        following.buffer = clamp_min("following.buffer", following.buffer, BUFFER_FLOOR);

        let response = &mut self.signal_response;
        response.braking_trigger = clamp_min("signal_response.braking_trigger", response.braking_trigger, 0.0);
        response.commit_distance = clamp_min("signal_response.commit_distance", response.commit_distance, 0.0);
        response.late_stop_distance = clamp_min(
            "signal_response.late_stop_distance",
            response.late_stop_distance,
            response.commit_distance,
        );
        response.stop_buffer = clamp_min("signal_response.stop_buffer", response.stop_buffer, 0.0);

        for spec in &mut self.classes {
            spec.length = clamp_min("classes.length", spec.length, 1.0);
            spec.width = clamp_min("classes.width", spec.width, 0.5);
            spec.acceleration = clamp_min("classes.acceleration", spec.acceleration, 0.1);
            spec.deceleration = clamp_min("classes.deceleration", spec.deceleration, 0.1);
        }

        if self.performance.timing_samples == 0 {
            log::warn!("performance.timing_samples = 0, using 1");
            self.performance.timing_samples = 1;
        }
    }
}
