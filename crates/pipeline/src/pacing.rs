use std::thread;
use std::time::{Duration, Instant};

/// Fixed-rate pacing: measure the work done this tick and sleep only the
/// remainder of the period. A slow tick just shortens (or skips) the next
/// sleep; no catch-up debt accumulates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TickPacer {
    period: Duration,
}

impl TickPacer {
    pub(crate) fn new(period: Duration) -> Self {
        Self { period }
    }

    pub(crate) fn pace(&self, tick_started: Instant) {
        let sleep = remaining_sleep(self.period, tick_started.elapsed());
        if sleep > Duration::ZERO {
            thread::sleep(sleep);
        }
    }
}

fn remaining_sleep(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}
