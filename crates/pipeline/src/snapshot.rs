use std::sync::Arc;

use crate::input::Player;
use crate::log::LogEntry;
use crate::slot::{Slot, SlotPoisoned};

/// The presentable state for one player, published once per aggregator tick.
#[derive(Debug, Clone, Default)]
pub struct PlayerView {
    /// Newest-first run log; index 0 is the live run.
    pub history: Vec<LogEntry>,
    /// Newest-first direction ring, always at its configured length.
    pub trajectory: Vec<u8>,
    /// False while the player is idle-reset and hidden from display.
    pub visible: bool,
}

/// One aggregator tick's complete, self-consistent output. Presenters only
/// ever receive whole snapshots, never a mix of two ticks.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub players: [PlayerView; 2],
    pub show_debug: bool,
}

impl Snapshot {
    pub fn player(&self, player: Player) -> &PlayerView {
        &self.players[player.index()]
    }
}

/// Cloneable reader/writer handle for the snapshot slot. The aggregator
/// publishes through it; presenters read the latest value at any time without
/// holding the aggregator up for longer than one copy.
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    slot: Arc<Slot<Snapshot>>,
}

impl SnapshotHandle {
    pub(crate) fn new(initial: Snapshot) -> Self {
        Self {
            slot: Arc::new(Slot::new(initial)),
        }
    }

    pub fn latest(&self) -> Result<Snapshot, SlotPoisoned> {
        self.slot.load()
    }

    pub(crate) fn publish(&self, snapshot: Snapshot) -> Result<(), SlotPoisoned> {
        self.slot.store(snapshot)
    }
}
