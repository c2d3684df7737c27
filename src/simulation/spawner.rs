use anyhow::{Context, Result};
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

use super::{Direction, MovementState, SimulationState, Vehicle, VehicleClass};
use crate::config::{ClassSpec, SimulationConfig};

pub struct VehicleSpawner {
    lanes: Vec<Direction>,
    classes: Vec<ClassSpec>,
    class_index: WeightedIndex<u32>,
    cruise_band: Uniform<f32>,
    spawn_rate: f32,
    max_per_lane: usize,
    entry_clearance: f32,
    world_extent: f32,
    rng: StdRng,
}

impl VehicleSpawner {
    pub fn new(config: &SimulationConfig, rng: StdRng) -> Result<Self> {
        let classes = config.vehicles.classes.clone();
        let class_index = WeightedIndex::new(classes.iter().map(|spec| spec.weight))
            .context("building vehicle class distribution")?;

        Ok(Self {
            lanes: config.intersection.lanes.clone(),
            classes,
            class_index,
            cruise_band: Self::cruise_band(config),
            spawn_rate: config.vehicles.traffic.spawn_rate,
            max_per_lane: config.vehicles.traffic.max_per_lane as usize,
            entry_clearance: config.vehicles.traffic.entry_clearance,
            world_extent: config.intersection.geometry.world_extent,
            rng,
        })
    }

    pub fn with_seed(config: &SimulationConfig, seed: u64) -> Result<Self> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    /// Picks up runtime setting changes. The random stream is left untouched.
    pub fn reconfigure(&mut self, config: &SimulationConfig) {
        self.cruise_band = Self::cruise_band(config);
        self.spawn_rate = config.vehicles.traffic.spawn_rate;
        self.max_per_lane = config.vehicles.traffic.max_per_lane as usize;
        self.entry_clearance = config.vehicles.traffic.entry_clearance;
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Probability of an arrival on one lane during a tick of length `dt`.
    pub fn spawn_probability(&self, dt: f32) -> f64 {
        1.0 - (-(self.spawn_rate as f64) * dt as f64).exp()
    }

    /// Runs one spawn pass. New vehicles are returned rather than inserted so
    /// they stay out of this tick's motion pass.
    pub fn spawn(&mut self, state: &mut SimulationState, dt: f32) -> Vec<Vehicle> {
        let probability = self.spawn_probability(dt);
        let mut spawned = Vec::new();

        for i in 0..self.lanes.len() {
            let direction = self.lanes[i];

            // Draw every tick so the random stream does not depend on traffic
            if self.rng.gen::<f64>() >= probability {
                continue;
            }

            if state.lane_count(direction) >= self.max_per_lane {
                log::debug!("Lane {:?} is at capacity ({}), skipping spawn", direction, self.max_per_lane);
                continue;
            }

            if !self.entry_is_clear(direction, state) {
                log::debug!("Entry of lane {:?} is occupied, skipping spawn", direction);
                continue;
            }

            let vehicle = self.create_vehicle(direction, state);
            log::debug!(
                "Spawned {:?} {} heading {:?} (cruise {:.1} m/s)",
                vehicle.class,
                vehicle.id.0,
                direction,
                vehicle.cruise_speed
            );
            spawned.push(vehicle);
        }

        spawned
    }

    /// True when no vehicle of the lane has its rear inside the entry zone.
    pub fn entry_is_clear(&self, direction: Direction, state: &SimulationState) -> bool {
        let zone_end = -self.world_extent + self.entry_clearance;
        !state
            .vehicles
            .iter()
            .any(|v| v.direction == direction && v.rear() < zone_end)
    }

    fn create_vehicle(&mut self, direction: Direction, state: &mut SimulationState) -> Vehicle {
        let spec = self.classes[self.class_index.sample(&mut self.rng)].clone();
        let cruise_speed = self.cruise_band.sample(&mut self.rng);

        Vehicle {
            id: state.next_vehicle_id(),
            class: spec.class,
            direction,
            // Front bumper sits on the edge of the visible area
            position: -self.world_extent - spec.length / 2.0,
            speed: 0.0,
            cruise_speed,
            length: spec.length,
            width: spec.width,
            acceleration: spec.acceleration,
            deceleration: spec.deceleration,
            state: MovementState::Stopped,
            crossed: false,
        }
    }

    pub fn class_weights(&self) -> Vec<(VehicleClass, u32)> {
        self.classes.iter().map(|spec| (spec.class, spec.weight)).collect()
    }

    fn cruise_band(config: &SimulationConfig) -> Uniform<f32> {
        let traffic = &config.vehicles.traffic;
        let low = traffic.cruise_speed * (1.0 - traffic.cruise_spread);
        let high = traffic.cruise_speed * (1.0 + traffic.cruise_spread);
        Uniform::new_inclusive(low, high.max(low))
    }
}
