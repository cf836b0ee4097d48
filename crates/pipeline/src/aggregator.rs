use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::chord::ChordToggle;
use crate::input::{RawFrame, RawSource, PLAYERS};
use crate::pacing::TickPacer;
use crate::runtime::{PipelineConfig, PipelineError, ShutdownFlag};
use crate::slot::Slot;
use crate::snapshot::{Snapshot, SnapshotHandle};
use crate::tracker::PlayerTracker;

/// Display-rate aggregation stage: turns the latest raw frame into run-length
/// log state, trajectory rings and the debug flag, and assembles the snapshot
/// to publish. All state here is loop-local; only the produced `Snapshot`
/// crosses a thread boundary, by value.
#[derive(Debug)]
pub struct Aggregator {
    players: [PlayerTracker; 2],
    chord: ChordToggle,
}

impl Aggregator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            players: [PlayerTracker::new(config), PlayerTracker::new(config)],
            chord: ChordToggle::default(),
        }
    }

    /// Advances one tick and returns the snapshot for it. The reset command
    /// applies to both players, exactly like the reset key it models.
    pub fn tick(&mut self, frame: RawFrame, reset_requested: bool) -> Snapshot {
        for player in PLAYERS {
            self.players[player.index()].tick(frame.player(player), reset_requested);
        }
        let show_debug = self.chord.update(frame.chord_asserted);
        self.assemble(show_debug)
    }

    /// The current state as a snapshot, without advancing a tick. Used to
    /// seed the snapshot slot before the loops start.
    pub fn snapshot(&self) -> Snapshot {
        self.assemble(self.chord.shown())
    }

    fn assemble(&self, show_debug: bool) -> Snapshot {
        Snapshot {
            players: [self.players[0].view(), self.players[1].view()],
            show_debug,
        }
    }
}

pub(crate) fn run_aggregator<S: RawSource + ?Sized>(
    source: Arc<S>,
    raw_slot: Arc<Slot<RawFrame>>,
    snapshots: SnapshotHandle,
    shutdown: ShutdownFlag,
    mut aggregator: Aggregator,
    period: Duration,
) -> Result<(), PipelineError> {
    info!(period_us = period.as_micros() as u64, "aggregator_started");
    let pacer = TickPacer::new(period);

    while !shutdown.is_requested() {
        let tick_started = Instant::now();

        // Lock held for the copy only; everything derived happens outside it.
        let frame = raw_slot.load()?;
        let reset_requested = source.reset_requested();

        let snapshot = aggregator.tick(frame, reset_requested);
        snapshots.publish(snapshot)?;

        pacer.pace(tick_started);
    }

    info!("aggregator_stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{PackedSample, Player, DIR_LEFT, DIR_RIGHT};

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            max_log: 6,
            trajectory_length: 5,
            max_run_length: 50,
            idle_reset_ticks: 12,
            ..PipelineConfig::default()
        }
    }

    fn frame_for(p1_direction: u8, p2_direction: u8) -> RawFrame {
        RawFrame {
            players: [
                PackedSample {
                    direction_index: p1_direction,
                    button_index: 0,
                },
                PackedSample {
                    direction_index: p2_direction,
                    button_index: 0,
                },
            ],
            chord_asserted: false,
        }
    }

    #[test]
    fn players_are_aggregated_independently() {
        let mut aggregator = Aggregator::new(&test_config());
        for _ in 0..3 {
            aggregator.tick(frame_for(DIR_RIGHT, 0), false);
        }
        let snapshot = aggregator.tick(frame_for(DIR_RIGHT, DIR_LEFT), false);

        let p1 = snapshot.player(Player::One);
        assert_eq!(p1.history.len(), 1);
        assert_eq!(p1.history[0].run_length, 4);

        let p2 = snapshot.player(Player::Two);
        assert_eq!(p2.history.len(), 1);
        assert_eq!(p2.history[0].direction_index, DIR_LEFT);
        assert_eq!(p2.history[0].run_length, 1);
    }

    #[test]
    fn chord_is_evaluated_once_per_tick_not_per_player() {
        let mut aggregator = Aggregator::new(&test_config());
        let mut chord_frame = frame_for(0, 0);
        chord_frame.chord_asserted = true;

        let mut snapshot = aggregator.tick(chord_frame, false);
        assert!(snapshot.show_debug);
        for _ in 0..99 {
            snapshot = aggregator.tick(chord_frame, false);
        }
        // Held chord: still the single toggle from the first tick.
        assert!(snapshot.show_debug);

        snapshot = aggregator.tick(frame_for(0, 0), false);
        assert!(snapshot.show_debug);
        chord_frame.chord_asserted = true;
        snapshot = aggregator.tick(chord_frame, false);
        assert!(!snapshot.show_debug);
    }

    #[test]
    fn reset_command_applies_to_both_players() {
        let mut aggregator = Aggregator::new(&test_config());
        for _ in 0..5 {
            aggregator.tick(frame_for(DIR_RIGHT, DIR_LEFT), false);
        }
        let snapshot = aggregator.tick(frame_for(0, 0), true);

        for player in PLAYERS {
            let view = snapshot.player(player);
            assert!(view.history.is_empty());
            assert!(view.visible);
            assert_eq!(view.trajectory, vec![0; 5]);
        }
    }

    #[test]
    fn seed_snapshot_has_full_length_trajectories_and_visible_players() {
        let aggregator = Aggregator::new(&test_config());
        let snapshot = aggregator.snapshot();
        for player in PLAYERS {
            let view = snapshot.player(player);
            assert!(view.visible);
            assert!(view.history.is_empty());
            assert_eq!(view.trajectory.len(), 5);
        }
        assert!(!snapshot.show_debug);
    }

    #[test]
    fn snapshot_trajectory_length_is_stable_across_many_ticks() {
        let mut aggregator = Aggregator::new(&test_config());
        for i in 0..200u32 {
            let direction = if i % 3 == 0 { DIR_RIGHT } else { 0 };
            let snapshot = aggregator.tick(frame_for(direction, direction), false);
            for player in PLAYERS {
                assert_eq!(snapshot.player(player).trajectory.len(), 5);
                assert!(snapshot.player(player).history.len() <= 6);
            }
        }
    }
}
