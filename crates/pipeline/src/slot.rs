use std::sync::Mutex;

use thiserror::Error;

/// A pipeline thread panicked while holding a slot lock. The slot contents
/// can no longer be trusted, so this is fatal for every loop touching it.
#[derive(Debug, Error)]
#[error("shared slot lock poisoned by a panicked pipeline thread")]
pub struct SlotPoisoned;

/// Single-value hand-off buffer between two fixed-rate loops.
///
/// Last write wins; there is no queue and no back-pressure. The lock is held
/// only for the copy in or out, so a slow reader never stalls the writer for
/// longer than one value-copy. Only full values cross the boundary — no
/// references escape the guard, which is what rules out torn reads.
#[derive(Debug)]
pub struct Slot<T> {
    value: Mutex<T>,
}

impl<T: Clone> Slot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    pub fn store(&self, value: T) -> Result<(), SlotPoisoned> {
        let mut guard = self.value.lock().map_err(|_| SlotPoisoned)?;
        *guard = value;
        Ok(())
    }

    pub fn load(&self) -> Result<T, SlotPoisoned> {
        let guard = self.value.lock().map_err(|_| SlotPoisoned)?;
        Ok(guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    struct Paired {
        left: u64,
        right: u64,
    }

    fn poison_slot(slot: &Slot<Paired>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = slot.value.lock().expect("lock");
                    panic!("poison slot");
                })
                .join();
        });
    }

    #[test]
    fn load_returns_latest_store() {
        let slot = Slot::new(Paired::default());
        slot.store(Paired { left: 3, right: 3 }).expect("store");
        slot.store(Paired { left: 7, right: 7 }).expect("store");
        assert_eq!(slot.load().expect("load"), Paired { left: 7, right: 7 });
    }

    #[test]
    fn poisoned_slot_reports_fatal_error_on_both_sides() {
        let slot = Slot::new(Paired::default());
        poison_slot(&slot);

        assert!(slot.load().is_err());
        assert!(slot.store(Paired { left: 1, right: 1 }).is_err());
    }

    #[test]
    fn rapid_concurrent_writes_never_tear_a_read() {
        let slot = Arc::new(Slot::new(Paired::default()));
        let writer_slot = Arc::clone(&slot);

        let writer = thread::spawn(move || {
            for i in 0..50_000u64 {
                writer_slot
                    .store(Paired { left: i, right: i })
                    .expect("store");
            }
        });

        let mut last_seen = 0;
        for _ in 0..50_000 {
            let value = slot.load().expect("load");
            assert_eq!(value.left, value.right, "torn read: {value:?}");
            assert!(value.left >= last_seen, "stale read after newer value");
            last_seen = value.left;
        }

        writer.join().expect("writer thread");
        let final_value = slot.load().expect("load");
        assert_eq!(final_value.left, final_value.right);
    }
}
