use serde::Serialize;

use super::{Direction, DirectionLights, MovementState, Phase, Point, VehicleClass, VehicleId};

/// Read-only view of one tick, handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f64,
    pub paused: bool,
    pub manual: bool,
    pub phase: Phase,
    pub countdown_ticks: u32,
    pub countdown_seconds: f32,
    pub lights: DirectionLights,
    pub telemetry: Telemetry,
    pub vehicles: Vec<VehicleSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub direction: Direction,
    pub lane_position: f32,
    pub position: Point,
    pub heading: f32,
    pub speed: f32,
    pub length: f32,
    pub width: f32,
    pub state: MovementState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    pub vehicle_count: usize,
    pub passed: u64,
    pub total_spawned: u64,
}

impl Snapshot {
    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleSnapshot> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn lane(&self, direction: Direction) -> impl Iterator<Item = &VehicleSnapshot> {
        self.vehicles.iter().filter(move |v| v.direction == direction)
    }
}
