use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use crate::config::ControlSettings;
use crate::simulation::{Axis, Snapshot, World};

#[cfg(feature = "async")]
pub mod realtime;

pub mod fixed;
pub mod frame;
pub mod timing;

pub use fixed::*;
pub use frame::*;
pub use timing::*;

#[cfg(feature = "async")]
pub use realtime::*;

/// Control-surface requests. They are queued and applied at the next tick
/// boundary, never in the middle of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum Command {
    Pause,
    Resume,
    Reset,
    SetManualMode(bool),
    ForcePhase(Axis),
    Configure(ControlSettings),
}

/// How many ticks to run for a slice of host time, and how long each is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickPlan {
    pub ticks: u32,
    pub dt: f32,
}

pub trait TickDriver {
    fn plan(&mut self, elapsed: Duration) -> TickPlan;
    fn reset(&mut self);
    fn get_name(&self) -> &'static str;
}

pub enum Driver {
    Fixed(FixedStepDriver),
    Frame(FrameDriver),
}

impl Driver {
    pub fn fixed(world: &World) -> Self {
        Driver::Fixed(FixedStepDriver::new(world.tick_interval()))
    }

    pub fn frame(world: &World) -> Self {
        Driver::Frame(FrameDriver::new(world.tick_interval()))
    }
}

impl TickDriver for Driver {
    fn plan(&mut self, elapsed: Duration) -> TickPlan {
        match self {
            Driver::Fixed(driver) => driver.plan(elapsed),
            Driver::Frame(driver) => driver.plan(elapsed),
        }
    }

    fn reset(&mut self) {
        match self {
            Driver::Fixed(driver) => driver.reset(),
            Driver::Frame(driver) => driver.reset(),
        }
    }

    fn get_name(&self) -> &'static str {
        match self {
            Driver::Fixed(driver) => driver.get_name(),
            Driver::Frame(driver) => driver.get_name(),
        }
    }
}

/// Sole owner of simulation time for one world.
pub struct Scheduler {
    world: World,
    driver: Driver,
    pending: VecDeque<Command>,
    timer: TickTimer,
}

impl Scheduler {
    pub fn new(world: World, driver: Driver) -> Self {
        let samples = world.config().vehicles.performance.timing_samples as usize;
        Self {
            world,
            driver,
            pending: VecDeque::new(),
            timer: TickTimer::new(samples),
        }
    }

    pub fn fixed_step(world: World) -> Self {
        let driver = Driver::fixed(&world);
        Self::new(world, driver)
    }

    pub fn frame_coupled(world: World) -> Self {
        let driver = Driver::frame(&world);
        Self::new(world, driver)
    }

    pub fn submit(&mut self, command: Command) {
        log::debug!("Queued {:?}", command);
        self.pending.push_back(command);
    }

    /// Runs exactly one nominal tick. Queued commands are applied first.
    pub fn step(&mut self) -> bool {
        let dt = self.world.tick_interval();
        self.run_tick(dt)
    }

    /// Feeds `elapsed` host time to the driver and runs the ticks it asks
    /// for. Returns how many ticks actually advanced the world.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let plan = self.driver.plan(elapsed);
        self.apply_pending();

        let mut advanced = 0;
        for _ in 0..plan.ticks {
            if self.run_tick(plan.dt) {
                advanced += 1;
            }
        }
        advanced
    }

    fn run_tick(&mut self, dt: f32) -> bool {
        self.apply_pending();
        self.timer.start_tick();
        let advanced = self.world.tick(dt);
        self.timer.end_tick();
        advanced
    }

    fn apply_pending(&mut self) {
        while let Some(command) = self.pending.pop_front() {
            match command {
                Command::Pause => self.world.pause(),
                Command::Resume => self.world.resume(),
                Command::Reset => {
                    self.world.reset();
                    self.driver.reset();
                }
                Command::SetManualMode(manual) => self.world.set_manual_mode(manual),
                Command::ForcePhase(axis) => {
                    self.world.force_phase(axis);
                }
                Command::Configure(settings) => self.world.apply_settings(&settings),
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.world.snapshot()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.get_name()
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    pub fn into_world(self) -> World {
        self.world
    }
}
