use crate::input::PackedSample;

/// One contiguous run of an unchanging combined state, counted in aggregator
/// ticks. `run_length` saturates at the display cap; readers render the cap
/// as the "LOT" marker instead of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub direction_index: u8,
    pub button_index: u8,
    pub run_length: u16,
}

impl LogEntry {
    pub fn matches(&self, sample: PackedSample) -> bool {
        self.direction_index == sample.direction_index && self.button_index == sample.button_index
    }

    /// True once the run has saturated at the given cap.
    pub fn is_capped(&self, max_run_length: u16) -> bool {
        self.run_length >= max_run_length
    }
}

/// Bounded newest-first run log for one player. Index 0 is the live,
/// still-incrementing run; a state change inserts a fresh entry at the front
/// and drops the tail once the capacity is exceeded.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<LogEntry>,
    max_log: usize,
}

impl History {
    pub fn new(max_log: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_log),
            max_log: max_log.max(1),
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut LogEntry> {
        self.entries.first_mut()
    }

    /// Starts a new run at the front, evicting the oldest entry at capacity.
    pub(crate) fn open_run(&mut self, sample: PackedSample) {
        self.entries.insert(
            0,
            LogEntry {
                direction_index: sample.direction_index,
                button_index: sample.button_index,
                run_length: 1,
            },
        );
        self.entries.truncate(self.max_log);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Fixed-length newest-first ring of recent direction indices, one per
/// aggregator tick. Always full; zero-filled before enough ticks have passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trajectory {
    directions: Vec<u8>,
}

impl Trajectory {
    pub fn new(length: usize) -> Self {
        Self {
            directions: vec![0; length.max(1)],
        }
    }

    pub fn directions(&self) -> &[u8] {
        &self.directions
    }

    pub(crate) fn push(&mut self, direction_index: u8) {
        self.directions.rotate_right(1);
        self.directions[0] = direction_index;
    }

    pub(crate) fn clear(&mut self) {
        self.directions.fill(0);
    }
}
