use instant::Instant;
use std::collections::VecDeque;
use std::time::Duration;

/// Rolling record of how long ticks take to compute.
#[derive(Debug)]
pub struct TickTimer {
    samples: VecDeque<Duration>,
    max_samples: usize,
    current_tick_start: Option<Instant>,
}

impl TickTimer {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            current_tick_start: None,
        }
    }

    pub fn start_tick(&mut self) {
        self.current_tick_start = Some(Instant::now());
    }

    pub fn end_tick(&mut self) {
        if let Some(start) = self.current_tick_start.take() {
            if self.samples.len() >= self.max_samples {
                self.samples.pop_front();
            }
            self.samples.push_back(start.elapsed());
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn average_tick_time(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    /// Ticks per second the engine could sustain at the current cost.
    pub fn headroom(&self) -> f32 {
        let average = self.average_tick_time();
        if average.is_zero() {
            return 0.0;
        }
        1.0 / average.as_secs_f32()
    }
}
