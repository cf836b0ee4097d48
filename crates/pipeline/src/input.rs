pub const DIR_UP: u8 = 0x1;
pub const DIR_DOWN: u8 = 0x2;
pub const DIR_LEFT: u8 = 0x4;
pub const DIR_RIGHT: u8 = 0x8;

pub const BTN_A: u8 = 0x1;
pub const BTN_B: u8 = 0x2;
pub const BTN_C: u8 = 0x4;
pub const BTN_D: u8 = 0x8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

pub const PLAYERS: [Player; 2] = [Player::One, Player::Two];

impl Player {
    pub const fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

/// Instantaneous held state of one player's eight logical inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawInputs {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub d: bool,
}

impl RawInputs {
    pub fn direction_index(&self) -> u8 {
        let mut index = 0;
        if self.up {
            index |= DIR_UP;
        }
        if self.down {
            index |= DIR_DOWN;
        }
        if self.left {
            index |= DIR_LEFT;
        }
        if self.right {
            index |= DIR_RIGHT;
        }
        index
    }

    pub fn button_index(&self) -> u8 {
        let mut index = 0;
        if self.a {
            index |= BTN_A;
        }
        if self.b {
            index |= BTN_B;
        }
        if self.c {
            index |= BTN_C;
        }
        if self.d {
            index |= BTN_D;
        }
        index
    }

    pub fn pack(&self) -> PackedSample {
        PackedSample {
            direction_index: self.direction_index(),
            button_index: self.button_index(),
        }
    }
}

/// One player's combined state for a single sampler tick, both indices in [0, 15].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedSample {
    pub direction_index: u8,
    pub button_index: u8,
}

impl PackedSample {
    pub const NEUTRAL: Self = Self {
        direction_index: 0,
        button_index: 0,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

/// What the sampler publishes each tick: the latest packed state for both
/// players plus the debug-chord condition. Overwritten in place, never queued.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFrame {
    pub players: [PackedSample; 2],
    pub chord_asserted: bool,
}

impl RawFrame {
    pub fn player(&self, player: Player) -> PackedSample {
        self.players[player.index()]
    }
}

/// Abstraction over the physical input state.
/// Implementations: KeyboardSource (winit-backed), scripted sources in tests.
///
/// All methods must be non-blocking and callable at arbitrary rate; the
/// sampler polls `sample` and `chord_asserted` at ~1 kHz while the aggregator
/// consumes `reset_requested` at the display rate.
pub trait RawSource: Send + Sync {
    fn sample(&self, player: Player) -> RawInputs;

    fn chord_asserted(&self) -> bool;

    /// True exactly once per reset-key press; consuming the flag rearms it.
    fn reset_requested(&self) -> bool;
}
