use crate::input::PackedSample;
use crate::log::{History, Trajectory};
use crate::runtime::PipelineConfig;
use crate::snapshot::PlayerView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResetKind {
    /// Reset key: the player stays active and visible.
    Explicit,
    /// Idle timeout: the player goes inactive and hidden until new input.
    IdleTimeout,
}

/// Per-player aggregation state: the run-length log, the trajectory ring and
/// the idle/no-op bookkeeping. Loop-local to the aggregator, never shared.
///
/// `no_op_ticks` counts consecutive neutral ticks while the player is active;
/// `None` is the inactive sentinel set by an idle-timeout reset. The counter
/// stops at the idle threshold, which triggers the reset on the next tick.
#[derive(Debug, Clone)]
pub(crate) struct PlayerTracker {
    history: History,
    trajectory: Trajectory,
    no_op_ticks: Option<u32>,
    max_run_length: u16,
    idle_reset_ticks: u32,
}

impl PlayerTracker {
    pub(crate) fn new(config: &PipelineConfig) -> Self {
        Self {
            history: History::new(config.max_log),
            trajectory: Trajectory::new(config.trajectory_length),
            no_op_ticks: Some(0),
            max_run_length: config.max_run_length,
            idle_reset_ticks: config.idle_reset_ticks,
        }
    }

    /// Advances one aggregator tick: reset policy, then the unconditional
    /// trajectory push, then run-length counting or log rotation.
    pub(crate) fn tick(&mut self, sample: PackedSample, explicit_reset: bool) {
        if explicit_reset {
            self.reset(ResetKind::Explicit);
        } else if matches!(self.no_op_ticks, Some(ticks) if ticks >= self.idle_reset_ticks) {
            self.reset(ResetKind::IdleTimeout);
        }

        self.trajectory.push(sample.direction_index);

        // While the history is empty the neutral state does not open a run:
        // the leading idle stretch at start or after a reset is never logged.
        let state_changed = match self.history.entries().first() {
            Some(front) => !front.matches(sample),
            None => !sample.is_neutral(),
        };

        if state_changed {
            self.history.open_run(sample);
            self.no_op_ticks = Some(1);
        } else {
            if let Some(front) = self.history.front_mut() {
                front.run_length = front.run_length.saturating_add(1).min(self.max_run_length);
            }
            if sample.is_neutral() {
                if let Some(ticks) = self.no_op_ticks {
                    self.no_op_ticks = Some(ticks.saturating_add(1).min(self.idle_reset_ticks));
                }
            }
        }
    }

    fn reset(&mut self, kind: ResetKind) {
        self.history.clear();
        self.trajectory.clear();
        self.no_op_ticks = match kind {
            ResetKind::Explicit => Some(0),
            ResetKind::IdleTimeout => None,
        };
    }

    pub(crate) fn visible(&self) -> bool {
        self.no_op_ticks.is_some()
    }

    /// Value-copy of the presentable state for this player.
    pub(crate) fn view(&self) -> PlayerView {
        PlayerView {
            history: self.history.entries().to_vec(),
            trajectory: self.trajectory.directions().to_vec(),
            visible: self.visible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DIR_RIGHT;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            max_log: 4,
            trajectory_length: 5,
            max_run_length: 10,
            idle_reset_ticks: 8,
            ..PipelineConfig::default()
        }
    }

    fn sample(direction_index: u8, button_index: u8) -> PackedSample {
        PackedSample {
            direction_index,
            button_index,
        }
    }

    fn hold(tracker: &mut PlayerTracker, state: PackedSample, ticks: u32) {
        for _ in 0..ticks {
            tracker.tick(state, false);
        }
    }

    #[test]
    fn held_state_counts_one_run_length_per_tick() {
        let mut tracker = PlayerTracker::new(&test_config());
        hold(&mut tracker, sample(DIR_RIGHT, 0), 3);

        let view = tracker.view();
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].direction_index, DIR_RIGHT);
        assert_eq!(view.history[0].run_length, 3);
    }

    #[test]
    fn run_length_saturates_at_the_cap() {
        let mut tracker = PlayerTracker::new(&test_config());
        hold(&mut tracker, sample(DIR_RIGHT, 0), 25);
        assert_eq!(tracker.view().history[0].run_length, 10);
    }

    #[test]
    fn state_change_rotates_the_log() {
        let mut tracker = PlayerTracker::new(&test_config());
        hold(&mut tracker, sample(DIR_RIGHT, 0), 4);
        tracker.tick(sample(DIR_RIGHT, 0x1), false);

        let view = tracker.view();
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.history[0].run_length, 1);
        assert_eq!(view.history[0].button_index, 0x1);
        assert_eq!(view.history[1].run_length, 4);
        assert_eq!(view.history[1].button_index, 0);
    }

    #[test]
    fn log_drops_the_tail_at_capacity() {
        let mut tracker = PlayerTracker::new(&test_config());
        for button in 1..=9u8 {
            tracker.tick(sample(DIR_RIGHT, button & 0xF), false);
        }
        let view = tracker.view();
        assert_eq!(view.history.len(), 4);
        assert_eq!(view.history[0].button_index, 9);
    }

    #[test]
    fn leading_neutral_run_is_never_logged() {
        let mut tracker = PlayerTracker::new(&test_config());
        hold(&mut tracker, PackedSample::NEUTRAL, 5);
        assert!(tracker.view().history.is_empty());

        // Worked sequence: right for 3 ticks, then neutral for 2.
        hold(&mut tracker, sample(DIR_RIGHT, 0), 3);
        hold(&mut tracker, PackedSample::NEUTRAL, 2);

        let view = tracker.view();
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.history[0].direction_index, 0);
        assert_eq!(view.history[0].run_length, 2);
        assert_eq!(view.history[1].direction_index, DIR_RIGHT);
        assert_eq!(view.history[1].run_length, 3);
        assert_eq!(view.trajectory, vec![0, 0, DIR_RIGHT, DIR_RIGHT, DIR_RIGHT]);
    }

    #[test]
    fn idle_timeout_hides_the_player_and_clears_state() {
        let config = test_config();
        let mut tracker = PlayerTracker::new(&config);
        hold(&mut tracker, sample(DIR_RIGHT, 0), 2);
        // Neutral until the counter reaches the threshold, then one more tick
        // to let the reset fire.
        hold(&mut tracker, PackedSample::NEUTRAL, config.idle_reset_ticks);
        assert!(tracker.visible());
        tracker.tick(PackedSample::NEUTRAL, false);

        let view = tracker.view();
        assert!(!view.visible);
        assert!(view.history.is_empty());
        assert_eq!(view.trajectory, vec![0; 5]);
    }

    #[test]
    fn idle_player_stays_hidden_until_new_input() {
        let config = test_config();
        let mut tracker = PlayerTracker::new(&config);
        hold(&mut tracker, sample(DIR_RIGHT, 0), 1);
        hold(
            &mut tracker,
            PackedSample::NEUTRAL,
            config.idle_reset_ticks + 5,
        );
        assert!(!tracker.visible());

        tracker.tick(sample(DIR_RIGHT, 0), false);
        let view = tracker.view();
        assert!(view.visible);
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].run_length, 1);
    }

    #[test]
    fn activity_before_the_threshold_restarts_the_idle_counter() {
        let config = test_config();
        let mut tracker = PlayerTracker::new(&config);
        hold(&mut tracker, PackedSample::NEUTRAL, config.idle_reset_ticks - 2);
        tracker.tick(sample(DIR_RIGHT, 0), false);
        // A fresh neutral run now has the full threshold ahead of it again.
        hold(&mut tracker, PackedSample::NEUTRAL, config.idle_reset_ticks - 1);
        assert!(tracker.visible());
    }

    #[test]
    fn explicit_reset_clears_state_but_keeps_the_player_visible() {
        let mut tracker = PlayerTracker::new(&test_config());
        hold(&mut tracker, sample(DIR_RIGHT, 0x3), 6);
        tracker.tick(PackedSample::NEUTRAL, true);

        let view = tracker.view();
        assert!(view.visible);
        assert!(view.history.is_empty());
        assert_eq!(view.trajectory, vec![0; 5]);
    }

    #[test]
    fn explicit_reset_while_holding_opens_a_fresh_run() {
        let mut tracker = PlayerTracker::new(&test_config());
        hold(&mut tracker, sample(DIR_RIGHT, 0), 6);
        tracker.tick(sample(DIR_RIGHT, 0), true);

        let view = tracker.view();
        assert!(view.visible);
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].run_length, 1);
        assert_eq!(view.trajectory[0], DIR_RIGHT);
        assert_eq!(view.trajectory[1], 0);
    }

    #[test]
    fn trajectory_advances_even_while_the_combined_state_is_unchanged() {
        let mut tracker = PlayerTracker::new(&test_config());
        hold(&mut tracker, sample(DIR_RIGHT, 0), 5);
        assert_eq!(tracker.view().trajectory, vec![DIR_RIGHT; 5]);
    }
}
