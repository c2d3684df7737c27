use super::{gap_ahead, Lane, LightColor, DirectionLights, MovementState, SimulationState, Vehicle};
use crate::config::{FollowingConfig, Geometry, SignalResponse, SimulationConfig, YellowPolicy};

/// Below this speed a vehicle is reported as stopped.
pub const STOPPED_SPEED: f32 = 0.05;

/// Distances below this count as having arrived at a hold point.
const HOLD_TOLERANCE: f32 = 1e-3;

pub struct MotionModel {
    geometry: Geometry,
    following: FollowingConfig,
    response: SignalResponse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionUpdate {
    pub speed: f32,
    pub position: f32,
    pub state: MovementState,
}

impl MotionModel {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            geometry: config.intersection.geometry.clone(),
            following: config.vehicles.following.clone(),
            response: config.vehicles.signal_response.clone(),
        }
    }

    /// Moves every vehicle one tick. Lanes are walked front-most first, so
    /// each follower sees where its leader ended up this tick. Returns the
    /// number of vehicles that cleared the intersection.
    pub fn update(&self, state: &mut SimulationState, lights: &DirectionLights, dt: f32) -> u32 {
        let lanes = Lane::build_all(&state.vehicles);
        let mut crossings = 0;

        for lane in &lanes {
            let light = lights.color(lane.direction);

            for (rank, &idx) in lane.members.iter().enumerate() {
                let leader = lane.leader_of(rank).map(|i| &state.vehicles[i]);
                let update = self.calculate_vehicle_update(&state.vehicles[idx], leader, light, dt);

                let vehicle = &mut state.vehicles[idx];
                vehicle.speed = update.speed;
                vehicle.position = update.position;
                vehicle.state = update.state;

                if self.detect_crossing(vehicle) {
                    crossings += 1;
                    log::debug!("Vehicle {} cleared the intersection heading {:?}", vehicle.id.0, vehicle.direction);
                }
            }
        }

        state.passed += u64::from(crossings);
        crossings
    }

    pub fn calculate_vehicle_update(
        &self,
        vehicle: &Vehicle,
        leader: Option<&Vehicle>,
        light: LightColor,
        dt: f32,
    ) -> MotionUpdate {
        let mut target = vehicle.cruise_speed;
        // Lane position the center should come to rest at
        let mut hold = f32::INFINITY;
        // Lane position the center may never pass this tick
        let mut limit = f32::INFINITY;

        if let Some(distance) = self.stop_line_distance(vehicle) {
            if self.must_stop_for_signal(vehicle, light, distance, dt) {
                let at_line = self.geometry.stop_line() - vehicle.half_length();
                hold = hold.min(at_line - self.response.stop_buffer);
                limit = limit.min(at_line + HOLD_TOLERANCE);
            }
        }

        let gap = gap_ahead(vehicle, leader);
        if gap.is_finite() {
            let behind_leader = vehicle.position + gap - self.following.min_gap;
            hold = hold.min(behind_leader);
            limit = limit.min(behind_leader);
            target = target.min(self.follow_cap(vehicle, gap));
        }

        if hold.is_finite() {
            let room = Self::room_to(hold, vehicle.position);
            target = target.min(braking_envelope(vehicle.deceleration, room, dt));
        }

        let mut speed = Self::integrate_speed(vehicle, target, dt);

        // Last-resort guard; the envelope keeps it from binding in normal driving
        if limit.is_finite() && dt > 0.0 {
            speed = speed.min((limit - vehicle.position).max(0.0) / dt);
        }

        MotionUpdate {
            speed,
            position: vehicle.position + speed * dt,
            state: if speed < STOPPED_SPEED {
                MovementState::Stopped
            } else {
                MovementState::Moving
            },
        }
    }

    /// Distance from the front bumper to the stop line while the vehicle is
    /// still approaching, `None` once it has entered the intersection.
    pub fn stop_line_distance(&self, vehicle: &Vehicle) -> Option<f32> {
        if vehicle.crossed {
            return None;
        }
        let distance = self.geometry.stop_line() - vehicle.front();
        if distance < -HOLD_TOLERANCE {
            None
        } else {
            Some(distance.max(0.0))
        }
    }

    /// Whether the signal obliges the vehicle to stop at the line. A vehicle
    /// that can no longer stop at its comfort deceleration is committed and
    /// carries on whatever the color.
    pub fn must_stop_for_signal(&self, vehicle: &Vehicle, light: LightColor, distance: f32, dt: f32) -> bool {
        if light == LightColor::Green || self.is_committed(vehicle, distance, dt) {
            return false;
        }
        match (light, self.response.yellow_policy) {
            (LightColor::Green, _) => false,
            (LightColor::Red, _) | (LightColor::Yellow, YellowPolicy::AlwaysStop) => {
                distance <= self.braking_trigger(vehicle)
            }
            (LightColor::Yellow, YellowPolicy::LateClear) => {
                distance > self.response.commit_distance && distance <= self.response.late_stop_distance
            }
        }
    }

    pub fn is_committed(&self, vehicle: &Vehicle, distance: f32, dt: f32) -> bool {
        self.braking_distance(vehicle, dt) > distance + HOLD_TOLERANCE
    }

    /// Distance covered when braking at the comfort deceleration from the
    /// next speed update on, one `dt` step at a time.
    pub fn braking_distance(&self, vehicle: &Vehicle, dt: f32) -> f32 {
        let speed = vehicle.speed;
        let step = vehicle.deceleration * dt;
        if dt <= 0.0 || !step.is_normal() {
            return speed * speed / (2.0 * vehicle.deceleration);
        }
        let ticks = (speed / step).floor();
        dt * (ticks * speed - step * ticks * (ticks + 1.0) / 2.0)
    }

    /// Configured trigger, stretched so the vehicle can always brake in time
    /// at its comfort deceleration.
    pub fn braking_trigger(&self, vehicle: &Vehicle) -> f32 {
        let speed = vehicle.speed.max(vehicle.cruise_speed);
        let stopping = speed * speed / (2.0 * vehicle.deceleration) + self.response.stop_buffer;
        self.response.braking_trigger.max(stopping)
    }

    /// Speed cap from the vehicle ahead: cruise speed outside the buffer
    /// band, falling linearly to zero at the minimum gap.
    pub fn follow_cap(&self, vehicle: &Vehicle, gap: f32) -> f32 {
        let min_gap = self.following.min_gap;
        if gap >= min_gap + self.following.buffer {
            return vehicle.cruise_speed;
        }
        let ratio = ((gap - min_gap) / self.following.buffer).clamp(0.0, 1.0);
        vehicle.cruise_speed * ratio
    }

    fn room_to(hold: f32, position: f32) -> f32 {
        let room = hold - position;
        if room < HOLD_TOLERANCE {
            0.0
        } else {
            room
        }
    }

    fn integrate_speed(vehicle: &Vehicle, target: f32, dt: f32) -> f32 {
        let speed = if target > vehicle.speed {
            (vehicle.speed + vehicle.acceleration * dt).min(target)
        } else {
            (vehicle.speed - vehicle.deceleration * dt).max(target)
        };
        speed.max(0.0)
    }

    fn detect_crossing(&self, vehicle: &mut Vehicle) -> bool {
        if vehicle.crossed || vehicle.position <= self.geometry.half_width {
            return false;
        }
        vehicle.crossed = true;
        true
    }

    pub fn has_exited(&self, vehicle: &Vehicle) -> bool {
        vehicle.rear() > self.geometry.world_extent
    }
}

/// Highest speed for this tick from which braking at `deceleration` on every
/// later tick still comes to rest within `room`. Speeds on this curve stay on
/// it under full braking, so a vehicle tracking it never needs to brake harder.
pub fn braking_envelope(deceleration: f32, room: f32, dt: f32) -> f32 {
    let (deceleration, room, dt) = (f64::from(deceleration), f64::from(room), f64::from(dt));
    let step = deceleration * dt;
    let unit = step * dt;
    if dt <= 0.0 || !unit.is_normal() {
        return (2.0 * deceleration * room).sqrt() as f32;
    }

    // Braking ticks needed after this one
    let covered = |ticks: f64| unit * ticks * (ticks + 1.0) / 2.0;
    let mut ticks = ((-3.0 + (1.0 + 8.0 * room / unit).sqrt()) / 2.0).ceil().max(0.0);
    while ticks > 0.0 && room <= covered(ticks) {
        ticks -= 1.0;
    }
    while room > covered(ticks + 1.0) {
        ticks += 1.0;
    }

    (room / (dt * (ticks + 1.0)) + step * ticks / 2.0) as f32
}
