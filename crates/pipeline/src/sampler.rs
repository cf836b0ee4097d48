use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::input::{Player, RawFrame, RawSource};
use crate::pacing::TickPacer;
use crate::runtime::{PipelineError, ShutdownFlag};
use crate::slot::Slot;

/// High-rate sampling stage: reads the source, packs both players and stores
/// the frame in the raw slot. Stateless apart from the pacer; every iteration
/// overwrites the slot whether or not anything changed.
pub(crate) fn run_sampler<S: RawSource + ?Sized>(
    source: Arc<S>,
    raw_slot: Arc<Slot<RawFrame>>,
    shutdown: ShutdownFlag,
    period: Duration,
) -> Result<(), PipelineError> {
    info!(period_us = period.as_micros() as u64, "sampler_started");
    let pacer = TickPacer::new(period);

    while !shutdown.is_requested() {
        let tick_started = Instant::now();

        let frame = RawFrame {
            players: [
                source.sample(Player::One).pack(),
                source.sample(Player::Two).pack(),
            ],
            chord_asserted: source.chord_asserted(),
        };
        raw_slot.store(frame)?;

        pacer.pace(tick_started);
    }

    info!("sampler_stopped");
    Ok(())
}
