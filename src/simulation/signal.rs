use serde::{Deserialize, Serialize};

use super::{Axis, Direction};
use crate::config::SignalConfig;

/// Signal phases in cycle order. The two all-red phases are kept apart so
/// that the successor of every phase is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    NsGreen,
    NsYellow,
    AllRedBeforeEw,
    EwGreen,
    EwYellow,
    AllRedBeforeNs,
}

impl Phase {
    pub const CYCLE: [Phase; 6] = [
        Phase::NsGreen,
        Phase::NsYellow,
        Phase::AllRedBeforeEw,
        Phase::EwGreen,
        Phase::EwYellow,
        Phase::AllRedBeforeNs,
    ];

    pub fn next(self) -> Phase {
        match self {
            Phase::NsGreen => Phase::NsYellow,
            Phase::NsYellow => Phase::AllRedBeforeEw,
            Phase::AllRedBeforeEw => Phase::EwGreen,
            Phase::EwGreen => Phase::EwYellow,
            Phase::EwYellow => Phase::AllRedBeforeNs,
            Phase::AllRedBeforeNs => Phase::NsGreen,
        }
    }

    pub fn green_for(axis: Axis) -> Phase {
        match axis {
            Axis::NorthSouth => Phase::NsGreen,
            Axis::EastWest => Phase::EwGreen,
        }
    }

    /// Axis that is not being held at red, if any.
    pub fn active_axis(self) -> Option<Axis> {
        match self {
            Phase::NsGreen | Phase::NsYellow => Some(Axis::NorthSouth),
            Phase::EwGreen | Phase::EwYellow => Some(Axis::EastWest),
            Phase::AllRedBeforeEw | Phase::AllRedBeforeNs => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightColor {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionLights {
    pub northbound: LightColor,
    pub southbound: LightColor,
    pub eastbound: LightColor,
    pub westbound: LightColor,
}

impl DirectionLights {
    pub fn color(&self, direction: Direction) -> LightColor {
        match direction {
            Direction::Northbound => self.northbound,
            Direction::Southbound => self.southbound,
            Direction::Eastbound => self.eastbound,
            Direction::Westbound => self.westbound,
        }
    }
}

/// Light colors for every direction under `phase`. This is the only place
/// the mapping lives.
pub fn lights_for(phase: Phase) -> DirectionLights {
    let (ns, ew) = match phase {
        Phase::NsGreen => (LightColor::Green, LightColor::Red),
        Phase::NsYellow => (LightColor::Yellow, LightColor::Red),
        Phase::EwGreen => (LightColor::Red, LightColor::Green),
        Phase::EwYellow => (LightColor::Red, LightColor::Yellow),
        Phase::AllRedBeforeEw | Phase::AllRedBeforeNs => (LightColor::Red, LightColor::Red),
    };
    DirectionLights {
        northbound: ns,
        southbound: ns,
        eastbound: ew,
        westbound: ew,
    }
}

/// Phase durations in whole ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub green: u32,
    pub yellow: u32,
    pub all_red: u32,
}

impl PhaseTimings {
    pub fn from_config(signal: &SignalConfig, tick_rate: f32) -> Self {
        Self {
            green: to_ticks(signal.green_duration, tick_rate),
            yellow: to_ticks(signal.yellow_duration, tick_rate),
            all_red: to_ticks(signal.all_red_duration, tick_rate),
        }
    }

    pub fn duration(&self, phase: Phase) -> u32 {
        match phase {
            Phase::NsGreen | Phase::EwGreen => self.green,
            Phase::NsYellow | Phase::EwYellow => self.yellow,
            Phase::AllRedBeforeEw | Phase::AllRedBeforeNs => self.all_red,
        }
    }

    pub fn cycle_length(&self) -> u32 {
        self.green.saturating_add(self.yellow).saturating_add(self.all_red).saturating_mul(2)
    }
}

fn to_ticks(seconds: f32, tick_rate: f32) -> u32 {
    // Every phase lasts at least one tick
    ((seconds * tick_rate).round() as u32).max(1)
}

#[derive(Debug, Clone)]
pub struct SignalController {
    phase: Phase,
    remaining: u32,
    manual: bool,
    timings: PhaseTimings,
}

impl SignalController {
    pub fn new(timings: PhaseTimings, manual: bool) -> Self {
        Self {
            phase: Phase::NsGreen,
            remaining: timings.duration(Phase::NsGreen),
            manual,
            timings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ticks left in the current phase.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn timings(&self) -> PhaseTimings {
        self.timings
    }

    pub fn lights(&self) -> DirectionLights {
        lights_for(self.phase)
    }

    /// Advances the countdown by one tick. Returns the new phase when it changed.
    pub fn tick(&mut self) -> Option<Phase> {
        if self.manual {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }

        self.enter(self.phase.next());
        Some(self.phase)
    }

    pub fn set_manual(&mut self, manual: bool) {
        if self.manual != manual {
            log::info!("Signal switched to {} mode", if manual { "manual" } else { "automatic" });
        }
        self.manual = manual;
    }

    /// Jumps straight to the green phase of `axis`, skipping yellow and
    /// all-red. Only honored in manual mode.
    pub fn force_phase(&mut self, axis: Axis) -> bool {
        if !self.manual {
            log::debug!("Ignoring forced {:?} phase outside manual mode", axis);
            return false;
        }
        self.enter(Phase::green_for(axis));
        log::info!("Signal forced to {:?}", self.phase);
        true
    }

    /// New timings take effect the next time a phase is entered.
    pub fn set_timings(&mut self, timings: PhaseTimings) {
        self.timings = timings;
    }

    pub fn reset(&mut self) {
        self.enter(Phase::NsGreen);
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.remaining = self.timings.duration(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timings() -> PhaseTimings {
        PhaseTimings {
            green: 4,
            yellow: 2,
            all_red: 1,
        }
    }

    #[test]
    fn successor_walks_the_whole_cycle() {
        for (i, phase) in Phase::CYCLE.iter().enumerate() {
            assert_eq!(phase.next(), Phase::CYCLE[(i + 1) % Phase::CYCLE.len()]);
        }
    }

    #[test]
    fn green_lasts_exactly_its_duration() {
        let mut signal = SignalController::new(timings(), false);
        for _ in 0..3 {
            assert_eq!(signal.tick(), None);
        }
        assert_eq!(signal.tick(), Some(Phase::NsYellow));
        assert_eq!(signal.remaining(), 2);
    }

    #[test]
    fn zero_duration_rounds_up_to_one_tick() {
        let config = SignalConfig {
            green_duration: 0.0,
            yellow_duration: 0.01,
            all_red_duration: 1.0,
            manual: false,
        };
        let timings = PhaseTimings::from_config(&config, 30.0);
        assert_eq!(timings.green, 1);
        assert_eq!(timings.yellow, 1);
        assert_eq!(timings.all_red, 30);
    }

    #[test]
    fn manual_mode_freezes_the_countdown() {
        let mut signal = SignalController::new(timings(), true);
        for _ in 0..100 {
            assert_eq!(signal.tick(), None);
        }
        assert_eq!(signal.phase(), Phase::NsGreen);
        assert_eq!(signal.remaining(), 4);
    }
}
