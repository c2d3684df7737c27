use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulation::{Direction, VehicleClass};

pub mod intersection;
pub mod vehicles;

pub use intersection::*;
pub use vehicles::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub intersection: IntersectionConfig,
    pub vehicles: VehiclesConfig,
}

impl SimulationConfig {
    pub fn load_from_files(intersection_path: &str, vehicles_path: &str) -> Result<Self> {
        let intersection_content = std::fs::read_to_string(intersection_path)
            .with_context(|| format!("reading {}", intersection_path))?;
        let vehicles_content = std::fs::read_to_string(vehicles_path)
            .with_context(|| format!("reading {}", vehicles_path))?;

        let intersection: IntersectionConfig = toml::from_str(&intersection_content)
            .with_context(|| format!("parsing {}", intersection_path))?;
        let vehicles: VehiclesConfig = toml::from_str(&vehicles_content)
            .with_context(|| format!("parsing {}", vehicles_path))?;

        let mut config = SimulationConfig { intersection, vehicles };

        // Structural problems are errors, numeric ones get clamped
        config.validate()?;
        config.sanitize();

        Ok(config)
    }

    /// Folds control-surface overrides into the configuration and clamps the result.
    pub fn apply_settings(&mut self, settings: &ControlSettings) {
        if let Some(rate) = settings.spawn_rate {
            self.vehicles.traffic.spawn_rate = rate;
        }
        if let Some(speed) = settings.cruise_speed {
            self.vehicles.traffic.cruise_speed = speed;
        }
        if let Some(gap) = settings.min_gap {
            self.vehicles.following.min_gap = gap;
        }
        if let Some(green) = settings.green_duration {
            self.intersection.signal.green_duration = green;
        }
        if let Some(yellow) = settings.yellow_duration {
            self.intersection.signal.yellow_duration = yellow;
        }
        self.sanitize();
    }

    /// Nominal length of one tick in seconds.
    pub fn tick_interval(&self) -> f32 {
        1.0 / self.intersection.tick_rate
    }
}

impl Validate for SimulationConfig {
    fn validate(&self) -> Result<()> {
        self.intersection.validate()?;
        self.vehicles.validate()?;
        Ok(())
    }
}

impl Sanitize for SimulationConfig {
    fn sanitize(&mut self) {
        self.intersection.sanitize();
        self.vehicles.sanitize();

        // Entry zone must fit the longest footprint plus the minimum gap,
        // otherwise back-to-back spawns could overlap.
        let longest = self
            .vehicles
            .classes
            .iter()
            .map(|class| class.length)
            .fold(0.0, f32::max);
        let floor = self.vehicles.following.min_gap + longest;
        let traffic = &mut self.vehicles.traffic;
        traffic.entry_clearance = clamp_min("traffic.entry_clearance", traffic.entry_clearance, floor);
    }
}

/// Optional overrides supplied by the control surface at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlSettings {
    pub spawn_rate: Option<f32>,
    pub cruise_speed: Option<f32>,
    pub min_gap: Option<f32>,
    pub green_duration: Option<f32>,
    pub yellow_duration: Option<f32>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("at least one vehicle class must be defined")]
    NoVehicleClasses,
    #[error("vehicle class weights must sum to a positive value")]
    ZeroClassWeight,
    #[error("vehicle class {0:?} is defined more than once")]
    DuplicateClass(VehicleClass),
    #[error("lane {0:?} is listed more than once")]
    DuplicateLane(Direction),
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Clamps numeric settings to safe floors instead of rejecting them.
pub trait Sanitize {
    fn sanitize(&mut self);
}

/// Non-finite values fall back to `floor`.
pub(crate) fn clamp_min(name: &str, value: f32, floor: f32) -> f32 {
    if !value.is_finite() || value < floor {
        log::warn!("{} = {} is outside the safe range, using {}", name, value, floor);
        floor
    } else {
        value
    }
}

pub(crate) fn clamp_range(name: &str, value: f32, floor: f32, ceiling: f32) -> f32 {
    if value > ceiling {
        log::warn!("{} = {} is above the allowed ceiling, using {}", name, value, ceiling);
        ceiling
    } else {
        clamp_min(name, value, floor)
    }
}
