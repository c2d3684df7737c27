use anyhow::Result;
use std::time::Duration;

use super::{
    Axis, Direction, MotionModel, MovementState, PhaseTimings, SignalController, SimulationState, Snapshot,
    Telemetry, Vehicle, VehicleClass, VehicleId, VehicleSnapshot, VehicleSpawner,
};
use crate::config::{ControlSettings, Sanitize, SimulationConfig, Validate};

/// Owns every piece of mutable simulation state. All mutation goes through
/// `tick` and the control methods, each of which needs `&mut self`.
pub struct World {
    config: SimulationConfig,
    state: SimulationState,
    signal: SignalController,
    spawner: VehicleSpawner,
    motion: MotionModel,
    seed: u64,
    paused: bool,
}

/// Where and how to drop a vehicle into the world by hand.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub direction: Direction,
    pub class: VehicleClass,
    pub position: f32,
    pub speed: f32,
    pub cruise_speed: Option<f32>,
}

impl Placement {
    pub fn new(direction: Direction, position: f32) -> Self {
        Self {
            direction,
            class: VehicleClass::Car,
            position,
            speed: 0.0,
            cruise_speed: None,
        }
    }

    pub fn class(mut self, class: VehicleClass) -> Self {
        self.class = class;
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn cruise_speed(mut self, cruise_speed: f32) -> Self {
        self.cruise_speed = Some(cruise_speed);
        self
    }
}

impl World {
    /// Uses the configured seed, or a random one when none is set.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let seed = config.vehicles.random.seed.unwrap_or_else(rand::random);
        Self::with_seed(config, seed)
    }

    pub fn with_seed(mut config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        config.sanitize();

        let timings = PhaseTimings::from_config(&config.intersection.signal, config.intersection.tick_rate);
        let signal = SignalController::new(timings, config.intersection.signal.manual);
        let spawner = VehicleSpawner::with_seed(&config, seed)?;
        let motion = MotionModel::new(&config);

        log::info!(
            "World '{}' ready: {} lanes, {:.0} Hz, seed {}",
            config.intersection.name,
            config.intersection.lanes.len(),
            config.intersection.tick_rate,
            seed
        );

        Ok(Self {
            config,
            state: SimulationState::new(),
            signal,
            spawner,
            motion,
            seed,
            paused: false,
        })
    }

    /// Runs one tick: signal, spawn, move, cleanup. Returns false without
    /// touching anything while paused.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.paused {
            return false;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(phase) = self.signal.tick() {
            log::debug!("Tick {}: signal entered {:?}", self.state.tick, phase);
        }
        let lights = self.signal.lights();

        let staged = self.spawner.spawn(&mut self.state, dt);
        self.motion.update(&mut self.state, &lights, dt);
        for vehicle in staged {
            self.state.add_vehicle(vehicle);
        }

        let before = self.state.vehicles.len();
        let motion = &self.motion;
        self.state.vehicles.retain(|v| !motion.has_exited(v));
        let exited = before - self.state.vehicles.len();
        if exited > 0 {
            log::debug!("Tick {}: {} vehicles left the world", self.state.tick, exited);
        }

        self.state.tick += 1;
        self.state.time += f64::from(dt);
        true
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("Simulation paused at tick {}", self.state.tick);
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            log::info!("Simulation resumed at tick {}", self.state.tick);
        }
        self.paused = false;
    }

    /// Clears every vehicle and counter, restarts the signal cycle and the
    /// random stream. Manual mode and pause survive a reset.
    pub fn reset(&mut self) {
        self.state.clear();
        self.signal.reset();
        self.spawner.reseed(self.seed);
        log::info!("Simulation reset");
    }

    pub fn set_manual_mode(&mut self, manual: bool) {
        self.signal.set_manual(manual);
    }

    /// Honored in manual mode only; silently ignored otherwise.
    pub fn force_phase(&mut self, axis: Axis) -> bool {
        self.signal.force_phase(axis)
    }

    pub fn apply_settings(&mut self, settings: &ControlSettings) {
        self.config.apply_settings(settings);
        self.spawner.reconfigure(&self.config);
        self.motion = MotionModel::new(&self.config);
        self.signal.set_timings(PhaseTimings::from_config(
            &self.config.intersection.signal,
            self.config.intersection.tick_rate,
        ));
        log::info!("Applied settings {:?}", settings);
    }

    pub fn place_vehicle(&mut self, placement: Placement) -> VehicleId {
        let spec = self.config.vehicles.class_spec(placement.class);
        let speed = placement.speed.max(0.0);
        let vehicle = Vehicle {
            id: self.state.next_vehicle_id(),
            class: spec.class,
            direction: placement.direction,
            position: placement.position,
            speed,
            cruise_speed: placement
                .cruise_speed
                .unwrap_or(self.config.vehicles.traffic.cruise_speed)
                .max(0.0),
            length: spec.length,
            width: spec.width,
            acceleration: spec.acceleration,
            deceleration: spec.deceleration,
            state: if speed < super::STOPPED_SPEED {
                MovementState::Stopped
            } else {
                MovementState::Moving
            },
            crossed: placement.position > self.config.intersection.geometry.half_width,
        };
        let id = vehicle.id;
        self.state.add_vehicle(vehicle);
        id
    }

    pub fn snapshot(&self) -> Snapshot {
        let geometry = &self.config.intersection.geometry;
        let vehicles = self
            .state
            .vehicles
            .iter()
            .map(|v| VehicleSnapshot {
                id: v.id,
                class: v.class,
                direction: v.direction,
                lane_position: v.position,
                position: v.world_position(geometry),
                heading: v.direction.heading(),
                speed: v.speed,
                length: v.length,
                width: v.width,
                state: v.state,
            })
            .collect();

        Snapshot {
            tick: self.state.tick,
            time: self.state.time,
            paused: self.paused,
            manual: self.signal.is_manual(),
            phase: self.signal.phase(),
            countdown_ticks: self.signal.remaining(),
            countdown_seconds: self.signal.remaining() as f32 * self.config.tick_interval(),
            lights: self.signal.lights(),
            telemetry: self.telemetry(),
            vehicles,
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            vehicle_count: self.state.vehicles.len(),
            passed: self.state.passed,
            total_spawned: self.state.total_spawned,
        }
    }

    pub fn vehicle_count(&self) -> usize {
        self.state.vehicles.len()
    }

    pub fn passed(&self) -> u64 {
        self.state.passed
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.state.vehicles
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn signal(&self) -> &SignalController {
        &self.signal
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Nominal tick length in seconds.
    pub fn tick_interval(&self) -> f32 {
        self.config.tick_interval()
    }

    pub fn nominal_step(&self) -> Duration {
        Duration::from_secs_f32(self.tick_interval())
    }
}
