use intersection_sim::{
    config::{SimulationConfig, YellowPolicy},
    simulation::{
        braking_envelope, gap_ahead, Direction, Lane, LightColor, MotionModel, MovementState, Vehicle, VehicleClass,
        VehicleId,
    },
};

const DT: f32 = 1.0 / 30.0;

fn car(id: u64, position: f32, speed: f32) -> Vehicle {
    Vehicle {
        id: VehicleId(id),
        class: VehicleClass::Car,
        direction: Direction::Northbound,
        position,
        speed,
        cruise_speed: 12.0,
        length: 4.5,
        width: 1.8,
        acceleration: 2.5,
        deceleration: 4.5,
        state: MovementState::Moving,
        crossed: false,
    }
}

/// A car whose front bumper is `distance` short of the default stop line.
fn car_before_line(distance: f32, speed: f32) -> Vehicle {
    car(1, -9.0 - distance - 2.25, speed)
}

fn model_with(policy: YellowPolicy) -> MotionModel {
    let mut config = SimulationConfig::default();
    config.vehicles.signal_response.yellow_policy = policy;
    MotionModel::new(&config)
}

#[test]
fn stop_line_distance_is_measured_from_the_front_bumper() {
    let model = model_with(YellowPolicy::LateClear);
    let vehicle = car_before_line(11.0, 10.0);
    let distance = model.stop_line_distance(&vehicle).unwrap();
    assert!((distance - 11.0).abs() < 1e-4);
}

#[test]
fn vehicles_past_the_line_ignore_the_signal() {
    let model = model_with(YellowPolicy::LateClear);

    let past_line = car(1, -9.0 + 0.5, 10.0);
    assert_eq!(model.stop_line_distance(&past_line), None);

    let mut crossed = car(2, 20.0, 10.0);
    crossed.crossed = true;
    assert_eq!(model.stop_line_distance(&crossed), None);
}

#[test]
fn late_clear_yellow_depends_on_distance() {
    let model = model_with(YellowPolicy::LateClear);
    let vehicle = car_before_line(30.0, 12.0);

    // Inside the commit distance the car keeps going
    assert!(!model.must_stop_for_signal(&vehicle, LightColor::Yellow, 5.0, DT));
    assert!(model.must_stop_for_signal(&vehicle, LightColor::Yellow, 20.0, DT));
    // Far away it waits for red before reacting
    assert!(!model.must_stop_for_signal(&vehicle, LightColor::Yellow, 50.0, DT));

    // A slow car inside the commit distance still clears
    let crawling = car_before_line(5.0, 3.0);
    assert!(!model.must_stop_for_signal(&crawling, LightColor::Yellow, 5.0, DT));
}

#[test]
fn always_stop_yellow_acts_like_red() {
    let model = model_with(YellowPolicy::AlwaysStop);
    let vehicle = car_before_line(5.0, 3.0);
    assert!(model.must_stop_for_signal(&vehicle, LightColor::Yellow, 5.0, DT));
    assert!(model.must_stop_for_signal(&vehicle, LightColor::Red, 5.0, DT));
}

#[test]
fn vehicle_that_cannot_stop_in_time_is_committed() {
    let model = model_with(YellowPolicy::AlwaysStop);
    let vehicle = car_before_line(5.0, 12.0);

    assert!(model.braking_distance(&vehicle, DT) > 15.0);
    assert!(model.is_committed(&vehicle, 5.0, DT));
    assert!(!model.must_stop_for_signal(&vehicle, LightColor::Yellow, 5.0, DT));
    assert!(!model.must_stop_for_signal(&vehicle, LightColor::Red, 5.0, DT));

    // Far enough back the same car is asked to stop again
    assert!(!model.is_committed(&vehicle, 20.0, DT));
    assert!(model.must_stop_for_signal(&vehicle, LightColor::Red, 20.0, DT));
}

#[test]
fn committed_vehicle_runs_the_red_at_speed() {
    let model = model_with(YellowPolicy::LateClear);
    let vehicle = car_before_line(1.25, 12.0);

    let update = model.calculate_vehicle_update(&vehicle, None, LightColor::Red, DT);
    assert_eq!(update.speed, 12.0);
    assert!(update.position > vehicle.position);
}

#[test]
fn red_only_matters_inside_the_braking_trigger() {
    let model = model_with(YellowPolicy::LateClear);
    let vehicle = car_before_line(59.0, 12.0);

    assert!((model.braking_trigger(&vehicle) - 60.0).abs() < 1e-4);
    assert!(model.must_stop_for_signal(&vehicle, LightColor::Red, 59.0, DT));
    assert!(!model.must_stop_for_signal(&vehicle, LightColor::Red, 61.0, DT));
    assert!(!model.must_stop_for_signal(&vehicle, LightColor::Green, 10.0, DT));
}

#[test]
fn braking_trigger_stretches_for_fast_heavy_vehicles() {
    let model = model_with(YellowPolicy::LateClear);
    let mut truck = car_before_line(105.0, 25.0);
    truck.class = VehicleClass::Truck;
    truck.deceleration = 3.0;

    let expected = 25.0 * 25.0 / (2.0 * 3.0) + 1.0;
    assert!((model.braking_trigger(&truck) - expected).abs() < 1e-3);
    assert!(model.must_stop_for_signal(&truck, LightColor::Red, 105.0, DT));
}

#[test]
fn follow_cap_scales_inside_the_buffer() {
    let model = model_with(YellowPolicy::LateClear);
    let vehicle = car(1, -50.0, 12.0);

    assert_eq!(model.follow_cap(&vehicle, 30.0), 12.0);
    assert_eq!(model.follow_cap(&vehicle, 12.0), 12.0);
    assert!((model.follow_cap(&vehicle, 7.0) - 6.0).abs() < 1e-4);
    assert_eq!(model.follow_cap(&vehicle, 2.0), 0.0);
    assert_eq!(model.follow_cap(&vehicle, 1.0), 0.0);
}

#[test]
fn open_lane_has_an_infinite_gap() {
    let vehicle = car(1, -50.0, 12.0);
    assert!(gap_ahead(&vehicle, None).is_infinite());

    let leader = car(2, -40.0, 0.0);
    assert!((gap_ahead(&vehicle, Some(&leader)) - 5.5).abs() < 1e-4);
}

#[test]
fn lane_orders_front_most_first() {
    let mut vehicles = vec![car(1, -80.0, 0.0), car(2, -20.0, 0.0), car(3, -50.0, 0.0)];
    let mut other = car(4, -10.0, 0.0);
    other.direction = Direction::Eastbound;
    vehicles.push(other);

    let lane = Lane::build(Direction::Northbound, &vehicles);
    assert_eq!(lane.members, vec![1, 2, 0]);
    assert_eq!(lane.leader_of(0), None);
    assert_eq!(lane.leader_of(2), Some(2));

    let lanes = Lane::build_all(&vehicles);
    assert_eq!(lanes.len(), 2);
}

#[test]
fn follower_never_overruns_a_stopped_leader() {
    let model = model_with(YellowPolicy::LateClear);
    let leader = car(1, -40.0, 0.0);
    // 0.25 m short of the minimum gap and far too fast to stop
    let follower = car(2, -40.0 - 4.5 - 2.25, 12.0);

    let update = model.calculate_vehicle_update(&follower, Some(&leader), LightColor::Green, DT);
    assert!(update.speed <= 0.25 * 30.0 + 1e-3);
    assert!(update.position <= follower.position + 0.25 + 1e-4);
}

#[test]
fn full_braking_from_the_envelope_ends_at_the_hold_point() {
    let deceleration = 4.5;
    for room in [0.002f32, 0.5, 3.0, 20.0, 80.0] {
        let mut speed = braking_envelope(deceleration, room, DT);
        let mut travelled = 0.0f32;
        while speed > 0.0 {
            travelled += speed * DT;
            speed = (speed - deceleration * DT).max(0.0);
        }
        assert!((travelled - room).abs() < 1e-2, "room {room}: travelled {travelled}");
    }

    assert_eq!(braking_envelope(deceleration, 0.0, DT), 0.0);
    // Without a step it falls back to the continuous curve
    assert!((braking_envelope(deceleration, 8.0, 0.0) - 72.0f32.sqrt()).abs() < 1e-4);
}

#[test]
fn green_light_accelerates_towards_cruise() {
    let model = model_with(YellowPolicy::LateClear);
    let vehicle = car(1, -60.0, 0.0);
    let dt = 1.0 / 30.0;

    let update = model.calculate_vehicle_update(&vehicle, None, LightColor::Green, dt);
    assert!((update.speed - 2.5 * dt).abs() < 1e-5);
    assert!(update.position > vehicle.position);
    assert_eq!(update.state, MovementState::Moving);

    let cruising = car(2, -60.0, 12.0);
    let update = model.calculate_vehicle_update(&cruising, None, LightColor::Green, dt);
    assert_eq!(update.speed, 12.0);
}

#[test]
fn stopped_follower_stays_put_at_the_minimum_gap() {
    let model = model_with(YellowPolicy::LateClear);
    let leader = car(1, -40.0, 0.0);
    // Exactly 2 m of clearance
    let follower = car(2, -40.0 - 4.5 - 2.0, 0.0);

    let update = model.calculate_vehicle_update(&follower, Some(&leader), LightColor::Green, DT);
    assert_eq!(update.speed, 0.0);
    assert_eq!(update.position, follower.position);
    assert_eq!(update.state, MovementState::Stopped);
}

#[test]
fn rear_past_the_world_edge_has_exited() {
    let model = model_with(YellowPolicy::LateClear);
    assert!(!model.has_exited(&car(1, 121.0, 12.0)));
    assert!(model.has_exited(&car(2, 122.5, 12.0)));
}
