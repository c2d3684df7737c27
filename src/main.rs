use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::Path;
use std::time::Duration;

use intersection_sim::{
    config::SimulationConfig,
    scheduler::{Command, Scheduler},
    simulation::{Axis, World},
};

#[derive(Parser)]
#[command(name = "intersection-sim")]
#[command(about = "Headless four-way intersection simulation")]
struct Args {
    /// Intersection configuration file
    #[arg(short, long, default_value = "intersection.toml")]
    intersection: String,

    /// Vehicles configuration file
    #[arg(long, default_value = "vehicles.toml")]
    vehicles: String,

    /// Random seed for reproducible simulations
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 3000)]
    ticks: u64,

    /// Pace ticks against the wall clock instead of running flat out
    #[arg(short, long)]
    realtime: bool,

    /// How simulation time is driven in real-time mode
    #[arg(long, value_enum, default_value_t = Pacing::Fixed)]
    pacing: Pacing,

    /// Start with the signal under manual control, holding this axis green
    #[arg(long, value_enum)]
    hold: Option<HoldAxis>,

    /// Write the final snapshot as TOML to this path
    #[arg(long)]
    snapshot: Option<String>,

    /// Enable verbose logging for detailed simulation progress
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Pacing {
    /// Fixed timestep accumulated from wall time
    Fixed,
    /// One tick per loop iteration using the measured delta
    Frame,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum HoldAxis {
    /// North/south traffic green
    Ns,
    /// East/west traffic green
    Ew,
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    if Path::new(&args.intersection).exists() && Path::new(&args.vehicles).exists() {
        info!("Loading configuration from {} and {}", args.intersection, args.vehicles);
        SimulationConfig::load_from_files(&args.intersection, &args.vehicles)
    } else {
        info!("Configuration files not found, using built-in defaults");
        Ok(SimulationConfig::default())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting Intersection Simulator (Console Mode)");

    let config = load_config(&args)?;
    let world = match args.seed.or(config.vehicles.random.seed) {
        Some(seed) => World::with_seed(config, seed)?,
        None => World::new(config)?,
    };

    if args.verbose {
        let config = world.config();
        let timings = world.signal().timings();
        info!(
            "Signal: green {} / yellow {} / all-red {} ticks, yellow policy {:?}",
            timings.green, timings.yellow, timings.all_red, config.vehicles.signal_response.yellow_policy
        );
        info!(
            "Traffic: {:.2} veh/s per lane, cruise {:.1} m/s, min gap {:.1} m",
            config.vehicles.traffic.spawn_rate,
            config.vehicles.traffic.cruise_speed,
            config.vehicles.following.min_gap
        );
    }

    let mut scheduler = match args.pacing {
        Pacing::Fixed => Scheduler::fixed_step(world),
        Pacing::Frame => Scheduler::frame_coupled(world),
    };
    info!("Driver: {}", scheduler.driver_name());

    if let Some(hold) = args.hold {
        scheduler.submit(Command::SetManualMode(true));
        scheduler.submit(Command::ForcePhase(match hold {
            HoldAxis::Ns => Axis::NorthSouth,
            HoldAxis::Ew => Axis::EastWest,
        }));
    }

    if args.realtime {
        run_paced(&mut scheduler, args.ticks);
    } else {
        for _ in 0..args.ticks {
            scheduler.step();
            log_progress(&scheduler);
        }
    }

    let telemetry = scheduler.world().telemetry();
    info!("Simulation completed!");
    info!("Ticks: {}", scheduler.world().state().tick);
    info!(
        "Vehicles: {} live, {} passed, {} spawned",
        telemetry.vehicle_count, telemetry.passed, telemetry.total_spawned
    );
    info!(
        "Average tick: {:.1}us ({:.0} ticks/s headroom)",
        scheduler.timer().average_tick_time().as_secs_f64() * 1e6,
        scheduler.timer().headroom()
    );

    if let Some(path) = &args.snapshot {
        let snapshot = toml::to_string_pretty(&scheduler.snapshot()).context("serializing snapshot")?;
        std::fs::write(path, snapshot).with_context(|| format!("writing {}", path))?;
        info!("Final snapshot written to {}", path);
    }

    Ok(())
}

fn run_paced(scheduler: &mut Scheduler, ticks: u64) {
    let step = scheduler.world().nominal_step();
    let mut last = instant::Instant::now();

    while scheduler.world().state().tick < ticks {
        let now = instant::Instant::now();
        let elapsed = now.duration_since(last);
        last = now;

        if scheduler.advance(elapsed) > 0 {
            log_progress(scheduler);
        }

        std::thread::sleep(step.min(Duration::from_millis(5)));
    }
}

fn log_progress(scheduler: &Scheduler) {
    let world = scheduler.world();
    let tick = world.state().tick;
    let ticks_per_second = world.config().intersection.tick_rate.round().max(1.0) as u64;
    if tick % ticks_per_second != 0 {
        return;
    }

    let snapshot = world.snapshot();
    info!(
        "Tick {}: phase {:?} ({:.1}s left), {} vehicles, {} passed",
        tick,
        snapshot.phase,
        snapshot.countdown_seconds,
        snapshot.telemetry.vehicle_count,
        snapshot.telemetry.passed
    );
}
