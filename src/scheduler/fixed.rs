use std::time::Duration;

use super::{TickDriver, TickPlan};

/// Upper bound on ticks run for one `plan` call, so a stalled host does
/// not trigger a long catch-up burst.
pub const MAX_CATCH_UP_TICKS: u32 = 8;

/// Accumulates host time and releases it in whole ticks of a fixed length.
pub struct FixedStepDriver {
    step: f64,
    accumulator: f64,
    max_catch_up: u32,
}

impl FixedStepDriver {
    pub fn new(step: f32) -> Self {
        Self {
            step: f64::from(step.max(f32::EPSILON)),
            accumulator: 0.0,
            max_catch_up: MAX_CATCH_UP_TICKS,
        }
    }

    pub fn with_max_catch_up(mut self, max_catch_up: u32) -> Self {
        self.max_catch_up = max_catch_up.max(1);
        self
    }

    pub fn step(&self) -> f32 {
        self.step as f32
    }
}

impl TickDriver for FixedStepDriver {
    fn plan(&mut self, elapsed: Duration) -> TickPlan {
        self.accumulator += elapsed.as_secs_f64();

        // Tolerance absorbs the rounding between f32 steps and Duration nanoseconds
        let due = (self.accumulator / self.step + 1e-4).floor() as u64;
        let ticks = due.min(u64::from(self.max_catch_up)) as u32;
        self.accumulator = (self.accumulator - f64::from(ticks) * self.step).max(0.0);

        if u64::from(ticks) < due {
            log::debug!("Dropping {} ticks of backlog", due - u64::from(ticks));
            self.accumulator = 0.0;
        }

        TickPlan {
            ticks,
            dt: self.step as f32,
        }
    }

    fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    fn get_name(&self) -> &'static str {
        "fixed-step"
    }
}
