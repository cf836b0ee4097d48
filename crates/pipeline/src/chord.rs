/// Edge-triggered toggle for the debug-chord key combination.
///
/// A continuous press flips the flag exactly once, on the first tick the
/// chord is observed asserted; releasing the chord rearms the toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChordToggle {
    shown: bool,
    triggered: bool,
    prev: bool,
}

impl ChordToggle {
    pub fn shown(&self) -> bool {
        self.shown
    }

    /// Feeds one tick's chord observation and returns the resulting flag.
    pub fn update(&mut self, asserted: bool) -> bool {
        if asserted && !self.prev && !self.triggered {
            self.shown = !self.shown;
            self.triggered = true;
        }
        if !asserted {
            self.triggered = false;
        }
        self.prev = asserted;
        self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chord_held_for_many_ticks_toggles_exactly_once() {
        let mut toggle = ChordToggle::default();
        for _ in 0..100 {
            toggle.update(true);
        }
        assert!(toggle.shown());
    }

    #[test]
    fn release_rearms_the_toggle() {
        let mut toggle = ChordToggle::default();
        toggle.update(true);
        assert!(toggle.shown());
        toggle.update(false);
        toggle.update(true);
        assert!(!toggle.shown());
    }

    #[test]
    fn unasserted_ticks_never_flip_the_flag() {
        let mut toggle = ChordToggle::default();
        for _ in 0..10 {
            assert!(!toggle.update(false));
        }
    }
}
