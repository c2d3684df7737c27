use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

use super::{Command, Scheduler};
use crate::simulation::Snapshot;

/// Handles a host keeps while the real-time loop runs.
pub struct RealtimeHandle {
    pub commands: mpsc::Sender<Command>,
    pub snapshots: watch::Receiver<Snapshot>,
}

/// Drives `scheduler` from a tokio interval at the nominal tick rate.
///
/// Interval ticks and incoming commands are handled in one task, so the
/// world only ever sees one mutation at a time. The loop ends when every
/// command sender has been dropped, and hands the scheduler back.
pub async fn run_realtime(
    mut scheduler: Scheduler,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Snapshot>,
) -> Scheduler {
    let mut interval = time::interval(scheduler.world().nominal_step());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log::info!("Real-time loop started at {:?} per tick", scheduler.world().nominal_step());

    loop {
        tokio::select! {
            _ = interval.tick() => {
                scheduler.step();
                snapshots.send_replace(scheduler.snapshot());
            }
            command = commands.recv() => match command {
                Some(command) => scheduler.submit(command),
                None => break,
            },
        }
    }

    log::info!("Real-time loop stopped at tick {}", scheduler.world().state().tick);
    scheduler
}

/// Spawns the real-time loop on the current runtime.
pub fn spawn_realtime(
    scheduler: Scheduler,
    buffer: usize,
) -> (RealtimeHandle, tokio::task::JoinHandle<Scheduler>) {
    let (command_tx, command_rx) = mpsc::channel(buffer.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(scheduler.snapshot());
    let task = tokio::spawn(run_realtime(scheduler, command_rx, snapshot_tx));

    (
        RealtimeHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        },
        task,
    )
}
