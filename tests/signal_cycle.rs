use intersection_sim::{
    config::SignalConfig,
    simulation::{lights_for, Axis, Direction, LightColor, Phase, PhaseTimings, SignalController},
};

fn test_timings() -> PhaseTimings {
    PhaseTimings {
        green: 5,
        yellow: 3,
        all_red: 2,
    }
}

#[test]
fn lights_agree_along_an_axis() {
    for phase in Phase::CYCLE {
        let lights = lights_for(phase);
        assert_eq!(lights.northbound, lights.southbound, "{:?}", phase);
        assert_eq!(lights.eastbound, lights.westbound, "{:?}", phase);
    }
}

#[test]
fn crossing_axes_are_never_both_open() {
    for phase in Phase::CYCLE {
        let lights = lights_for(phase);
        let ns = lights.color(Direction::Northbound);
        let ew = lights.color(Direction::Eastbound);
        assert!(ns == LightColor::Red || ew == LightColor::Red, "{:?} opens both axes", phase);

        match phase.active_axis() {
            Some(Axis::NorthSouth) => assert_eq!(ew, LightColor::Red),
            Some(Axis::EastWest) => assert_eq!(ns, LightColor::Red),
            None => {
                assert_eq!(ns, LightColor::Red);
                assert_eq!(ew, LightColor::Red);
            }
        }
    }
}

#[test]
fn every_cycle_visits_all_six_phases_in_order() {
    let timings = test_timings();
    let mut signal = SignalController::new(timings, false);
    let mut observed = vec![signal.phase()];

    for _ in 0..timings.cycle_length() {
        if let Some(phase) = signal.tick() {
            observed.push(phase);
        }
    }

    // Back at the start after exactly one cycle
    assert_eq!(observed.last(), Some(&Phase::NsGreen));
    assert_eq!(&observed[..6], &Phase::CYCLE[..]);
    assert_eq!(signal.remaining(), timings.green);
}

#[test]
fn each_phase_lasts_its_configured_ticks() {
    let timings = test_timings();
    let mut signal = SignalController::new(timings, false);

    for phase in Phase::CYCLE {
        assert_eq!(signal.phase(), phase);
        let duration = timings.duration(phase);
        for _ in 1..duration {
            assert_eq!(signal.tick(), None);
            assert_eq!(signal.phase(), phase);
        }
        assert_eq!(signal.tick(), Some(phase.next()));
    }
}

#[test]
fn default_timings_follow_the_tick_rate() {
    let timings = PhaseTimings::from_config(&SignalConfig::default(), 30.0);
    assert_eq!(timings.green, 150);
    assert_eq!(timings.yellow, 60);
    assert_eq!(timings.all_red, 30);
    assert_eq!(timings.cycle_length(), 480);
}

#[test]
fn forced_phase_needs_manual_mode() {
    let mut signal = SignalController::new(test_timings(), false);
    assert!(!signal.force_phase(Axis::EastWest));
    assert_eq!(signal.phase(), Phase::NsGreen);

    signal.set_manual(true);
    assert!(signal.force_phase(Axis::EastWest));
    assert_eq!(signal.phase(), Phase::EwGreen);
    assert_eq!(signal.remaining(), test_timings().green);

    // Leaving manual mode resumes the countdown from the forced phase
    signal.set_manual(false);
    for _ in 1..test_timings().green {
        assert_eq!(signal.tick(), None);
    }
    assert_eq!(signal.tick(), Some(Phase::EwYellow));
}

#[test]
fn new_timings_wait_for_the_next_phase() {
    let mut signal = SignalController::new(test_timings(), false);
    signal.tick();
    assert_eq!(signal.remaining(), 4);

    signal.set_timings(PhaseTimings {
        green: 5,
        yellow: 7,
        all_red: 2,
    });
    assert_eq!(signal.remaining(), 4);

    for _ in 0..4 {
        signal.tick();
    }
    assert_eq!(signal.phase(), Phase::NsYellow);
    assert_eq!(signal.remaining(), 7);
}

#[test]
fn reset_returns_to_north_south_green() {
    let mut signal = SignalController::new(test_timings(), false);
    for _ in 0..12 {
        signal.tick();
    }
    assert_ne!(signal.phase(), Phase::NsGreen);

    signal.reset();
    assert_eq!(signal.phase(), Phase::NsGreen);
    assert_eq!(signal.remaining(), test_timings().green);
}
