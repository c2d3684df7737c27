use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::config::Geometry;

pub mod lane;
pub mod motion;
pub mod signal;
pub mod snapshot;
pub mod spawner;
pub mod world;

pub use lane::*;
pub use motion::*;
pub use signal::*;
pub use snapshot::*;
pub use spawner::*;
pub use world::*;

pub type Vec2 = Vector2<f32>;
pub type Point = Point2<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    NorthSouth,
    EastWest,
}

/// Direction of travel. Every direction owns exactly one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Northbound,
    Southbound,
    Eastbound,
    Westbound,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Northbound,
        Direction::Southbound,
        Direction::Eastbound,
        Direction::Westbound,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Direction::Northbound | Direction::Southbound => Axis::NorthSouth,
            Direction::Eastbound | Direction::Westbound => Axis::EastWest,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit vector of travel, with +y pointing north.
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Northbound => Vec2::new(0.0, 1.0),
            Direction::Southbound => Vec2::new(0.0, -1.0),
            Direction::Eastbound => Vec2::new(1.0, 0.0),
            Direction::Westbound => Vec2::new(-1.0, 0.0),
        }
    }

    pub fn heading(self) -> f32 {
        let unit = self.unit();
        unit.y.atan2(unit.x)
    }

    /// Offset of the lane centerline from the road centerline (right-hand traffic).
    fn lateral(self) -> Vec2 {
        let unit = self.unit();
        Vec2::new(unit.y, -unit.x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Taxi,
    Truck,
    Bus,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 4] = [
        VehicleClass::Car,
        VehicleClass::Taxi,
        VehicleClass::Truck,
        VehicleClass::Bus,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementState {
    Moving,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub direction: Direction,
    /// Lane position of the vehicle center; 0 is the intersection center.
    pub position: f32,
    pub speed: f32,
    pub cruise_speed: f32,
    pub length: f32,
    pub width: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub state: MovementState,
    pub crossed: bool,
}

impl Vehicle {
    pub fn half_length(&self) -> f32 {
        self.length / 2.0
    }

    pub fn front(&self) -> f32 {
        self.position + self.half_length()
    }

    pub fn rear(&self) -> f32 {
        self.position - self.half_length()
    }

    pub fn world_position(&self, geometry: &Geometry) -> Point {
        let direction = self.direction;
        Point::origin() + direction.unit() * self.position + direction.lateral() * geometry.lane_offset
    }
}

/// Authoritative vehicle collection plus the counters that go with it.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    pub vehicles: Vec<Vehicle>,
    pub tick: u64,
    pub time: f64,
    pub passed: u64,
    pub total_spawned: u64,
    next_id: u64,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.push(vehicle);
        self.total_spawned += 1;
    }

    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn get_vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn lane_count(&self, direction: Direction) -> usize {
        self.vehicles.iter().filter(|v| v.direction == direction).count()
    }

    /// Drops all vehicles and counters. Ids keep counting up so nothing from
    /// before the reset can be confused with what comes after.
    pub fn clear(&mut self) {
        self.vehicles.clear();
        self.tick = 0;
        self.time = 0.0;
        self.passed = 0;
        self.total_spawned = 0;
    }
}
