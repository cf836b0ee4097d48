//! Two-player input display pipeline: a high-rate sampler, a display-rate
//! aggregator and the slots and snapshots connecting them to a presenter.

mod aggregator;
mod chord;
mod input;
mod log;
mod pacing;
mod runtime;
mod sampler;
mod slot;
mod snapshot;
mod tracker;

pub use aggregator::Aggregator;
pub use chord::ChordToggle;
pub use input::{
    PackedSample, Player, RawFrame, RawInputs, RawSource, BTN_A, BTN_B, BTN_C, BTN_D, DIR_DOWN,
    DIR_LEFT, DIR_RIGHT, DIR_UP, PLAYERS,
};
pub use log::{History, LogEntry, Trajectory};
pub use runtime::{Pipeline, PipelineConfig, PipelineError, ShutdownFlag};
pub use slot::{Slot, SlotPoisoned};
pub use snapshot::{PlayerView, Snapshot, SnapshotHandle};
