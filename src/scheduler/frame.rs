use std::time::Duration;

use super::{TickDriver, TickPlan};

/// One tick per rendered frame, using the frame's own delta. The delta is
/// capped at a few nominal ticks so a hitch cannot teleport vehicles.
pub struct FrameDriver {
    nominal: f32,
    max_dt: f32,
}

impl FrameDriver {
    pub fn new(nominal: f32) -> Self {
        Self {
            nominal,
            max_dt: nominal * 4.0,
        }
    }
}

impl TickDriver for FrameDriver {
    fn plan(&mut self, elapsed: Duration) -> TickPlan {
        let dt = elapsed.as_secs_f32();
        // The first frame usually reports no elapsed time
        let dt = if dt > 0.0 { dt.min(self.max_dt) } else { self.nominal };
        TickPlan { ticks: 1, dt }
    }

    fn reset(&mut self) {}

    fn get_name(&self) -> &'static str {
        "frame-coupled"
    }
}
