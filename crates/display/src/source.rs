use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use pipeline::{Player, RawInputs, RawSource};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

// One bit per tracked physical key. Player one occupies the low byte, player
// two the next one, the debug-chord keys sit above both.
const P1_SHIFT: u32 = 0;
const P2_SHIFT: u32 = 8;
const BIT_UP: u32 = 1 << 0;
const BIT_DOWN: u32 = 1 << 1;
const BIT_LEFT: u32 = 1 << 2;
const BIT_RIGHT: u32 = 1 << 3;
const BIT_A: u32 = 1 << 4;
const BIT_B: u32 = 1 << 5;
const BIT_C: u32 = 1 << 6;
const BIT_D: u32 = 1 << 7;
const BIT_CHORD_1: u32 = 1 << 16;
const BIT_CHORD_5: u32 = 1 << 17;
const BIT_CHORD_2: u32 = 1 << 18;
const BIT_CHORD_6: u32 = 1 << 19;

/// Keyboard-backed input source shared between the window event loop and the
/// sampler thread. Held keys live in one atomic word, so the sampler reads a
/// coherent set of both players' keys without any lock.
///
/// Player one plays on WASD with N, M, comma and period for the buttons;
/// player two on the arrow keys with numpad 1 through 4.
#[derive(Debug, Default)]
pub struct KeyboardSource {
    held: AtomicU32,
    reset_latch: AtomicBool,
}

impl KeyboardSource {
    pub fn handle_key_event(&self, event: &KeyEvent) {
        if let PhysicalKey::Code(code) = event.physical_key {
            self.apply_key(code, event.state == ElementState::Pressed, event.repeat);
        }
    }

    /// Applies one key transition. OS auto-repeat presses are ignored so the
    /// reset latch fires once per physical press; held-state bits are
    /// idempotent either way.
    fn apply_key(&self, code: KeyCode, pressed: bool, repeat: bool) {
        if code == KeyCode::Delete {
            if pressed && !repeat {
                self.reset_latch.store(true, Ordering::Relaxed);
            }
            return;
        }

        let Some(bit) = key_bit(code) else {
            return;
        };
        if pressed {
            self.held.fetch_or(bit, Ordering::Relaxed);
        } else {
            self.held.fetch_and(!bit, Ordering::Relaxed);
        }
    }
}

impl RawSource for KeyboardSource {
    fn sample(&self, player: Player) -> RawInputs {
        let held = self.held.load(Ordering::Relaxed);
        let bits = match player {
            Player::One => held >> P1_SHIFT,
            Player::Two => held >> P2_SHIFT,
        };
        RawInputs {
            up: bits & BIT_UP != 0,
            down: bits & BIT_DOWN != 0,
            left: bits & BIT_LEFT != 0,
            right: bits & BIT_RIGHT != 0,
            a: bits & BIT_A != 0,
            b: bits & BIT_B != 0,
            c: bits & BIT_C != 0,
            d: bits & BIT_D != 0,
        }
    }

    fn chord_asserted(&self) -> bool {
        let held = self.held.load(Ordering::Relaxed);
        let one_five = held & BIT_CHORD_1 != 0 && held & BIT_CHORD_5 != 0;
        let two_six = held & BIT_CHORD_2 != 0 && held & BIT_CHORD_6 != 0;
        one_five || two_six
    }

    fn reset_requested(&self) -> bool {
        self.reset_latch.swap(false, Ordering::Relaxed)
    }
}

fn key_bit(code: KeyCode) -> Option<u32> {
    let bit = match code {
        KeyCode::KeyW => BIT_UP << P1_SHIFT,
        KeyCode::KeyS => BIT_DOWN << P1_SHIFT,
        KeyCode::KeyA => BIT_LEFT << P1_SHIFT,
        KeyCode::KeyD => BIT_RIGHT << P1_SHIFT,
        KeyCode::KeyN => BIT_A << P1_SHIFT,
        KeyCode::KeyM => BIT_B << P1_SHIFT,
        KeyCode::Comma => BIT_C << P1_SHIFT,
        KeyCode::Period => BIT_D << P1_SHIFT,
        KeyCode::ArrowUp => BIT_UP << P2_SHIFT,
        KeyCode::ArrowDown => BIT_DOWN << P2_SHIFT,
        KeyCode::ArrowLeft => BIT_LEFT << P2_SHIFT,
        KeyCode::ArrowRight => BIT_RIGHT << P2_SHIFT,
        KeyCode::Numpad1 => BIT_A << P2_SHIFT,
        KeyCode::Numpad2 => BIT_B << P2_SHIFT,
        KeyCode::Numpad3 => BIT_C << P2_SHIFT,
        KeyCode::Numpad4 => BIT_D << P2_SHIFT,
        KeyCode::Digit1 => BIT_CHORD_1,
        KeyCode::Digit5 => BIT_CHORD_5,
        KeyCode::Digit2 => BIT_CHORD_2,
        KeyCode::Digit6 => BIT_CHORD_6,
        _ => return None,
    };
    Some(bit)
}
