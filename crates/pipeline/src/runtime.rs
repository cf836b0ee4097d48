use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use crate::aggregator::{run_aggregator, Aggregator};
use crate::input::{RawFrame, RawSource};
use crate::sampler::run_sampler;
use crate::slot::{Slot, SlotPoisoned};
use crate::snapshot::SnapshotHandle;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    SlotPoisoned(#[from] SlotPoisoned),

    #[error("failed to spawn {name} thread")]
    SpawnThread {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{name} thread panicked")]
    ThreadPanicked { name: &'static str },
}

/// Timing and capacity knobs for the pipeline. `Default` is the production
/// configuration; tests shrink the capacities and speed up the clocks.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sampling loop period, nominally 1 kHz.
    pub sample_period: Duration,
    /// Aggregation loop period, nominally 60 Hz.
    pub tick_period: Duration,
    /// Run log capacity per player.
    pub max_log: usize,
    /// Direction ring length per player.
    pub trajectory_length: usize,
    /// Run-length saturation cap.
    pub max_run_length: u16,
    /// Consecutive neutral ticks before an idle reset.
    pub idle_reset_ticks: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(1),
            tick_period: Duration::from_nanos(16_666_666),
            max_log: 22,
            trajectory_length: 15,
            max_run_length: 1000,
            idle_reset_ticks: 1800,
        }
    }
}

/// Cooperative stop signal shared by the pipeline threads. Loops observe it
/// at the top of each iteration and always finish the iteration in progress.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn request(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

/// The running sampler and aggregator threads plus the handles to talk to
/// them. Dropping the pipeline does not stop it; call `request_shutdown` and
/// `join` for an orderly exit.
#[derive(Debug)]
pub struct Pipeline {
    snapshots: SnapshotHandle,
    shutdown: ShutdownFlag,
    workers: Vec<Worker>,
}

#[derive(Debug)]
struct Worker {
    name: &'static str,
    handle: JoinHandle<Result<(), PipelineError>>,
}

impl Pipeline {
    /// Spawns both stages against the given source. The snapshot slot is
    /// seeded with an initial snapshot before either thread starts, so
    /// `snapshots().latest()` never observes a missing value.
    pub fn spawn<S>(source: Arc<S>, config: PipelineConfig) -> Result<Self, PipelineError>
    where
        S: RawSource + 'static,
    {
        let aggregator = Aggregator::new(&config);
        let snapshots = SnapshotHandle::new(aggregator.snapshot());
        let raw_slot = Arc::new(Slot::new(RawFrame::default()));
        let shutdown = ShutdownFlag::default();

        let sampler = spawn_worker("sampler", {
            let source = Arc::clone(&source);
            let raw_slot = Arc::clone(&raw_slot);
            let shutdown = shutdown.clone();
            let period = config.sample_period;
            move || run_sampler(source, raw_slot, shutdown, period)
        })?;

        let aggregator_worker = spawn_worker("aggregator", {
            let snapshots = snapshots.clone();
            let shutdown = shutdown.clone();
            let period = config.tick_period;
            move || run_aggregator(source, raw_slot, snapshots, shutdown, aggregator, period)
        })?;

        let workers = vec![sampler, aggregator_worker];
        Ok(Self {
            snapshots,
            shutdown,
            workers,
        })
    }

    pub fn snapshots(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }

    pub fn request_shutdown(&self) {
        info!("shutdown_requested");
        self.shutdown.request();
    }

    /// Waits for both threads and surfaces the first failure. A panicked
    /// thread is reported as its own error rather than re-panicking here.
    pub fn join(self) -> Result<(), PipelineError> {
        let mut first_error = None;
        for worker in self.workers {
            match worker.handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    warn!(worker = worker.name, %error, "worker_failed");
                    first_error.get_or_insert(error);
                }
                Err(_) => {
                    warn!(worker = worker.name, "worker_panicked");
                    first_error.get_or_insert(PipelineError::ThreadPanicked { name: worker.name });
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn spawn_worker<F>(name: &'static str, body: F) -> Result<Worker, PipelineError>
where
    F: FnOnce() -> Result<(), PipelineError> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.to_owned())
        .spawn(body)
        .map_err(|source| PipelineError::SpawnThread { name, source })?;
    Ok(Worker { name, handle })
}
