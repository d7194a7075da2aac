use crate::error::TurnoutError;
use crate::types::EventId;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

type Slot = Arc<Mutex<()>>;

/// Per-event mutual exclusion for the read-decide-write sequence.
///
/// Clones share one table, so every `Turnout` handle that writes to the same
/// stores must be built with clones of the same `EventLocks`.
#[derive(Clone, Default)]
pub struct EventLocks {
    slots: Arc<Mutex<HashMap<EventId, Slot>>>,
}

/// Releases the event on drop.
pub struct EventGuard {
    locks: EventLocks,
    event_id: EventId,
    held: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits at most `timeout` for exclusive access to `event_id`.
    pub fn acquire(
        &self,
        event_id: &EventId,
        timeout: Duration,
    ) -> Result<EventGuard, TurnoutError> {
        let slot = Arc::clone(self.slots.lock().entry(event_id.clone()).or_default());
        let held = slot.try_lock_arc_for(timeout);
        drop(slot);

        let Some(held) = held else {
            self.forget_if_idle(event_id);
            tracing::warn!(
                event_id = %event_id,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "event lock wait timed out"
            );
            return Err(TurnoutError::Unavailable {
                message: format!("timed out waiting for event {event_id}"),
            });
        };

        Ok(EventGuard {
            locks: self.clone(),
            event_id: event_id.clone(),
            held: Some(held),
        })
    }

    /// Number of events with a holder or waiter.
    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }

    // Holders and waiters each keep a clone of the slot, so a count of one
    // means only the table references it.
    fn forget_if_idle(&self, event_id: &EventId) {
        let mut slots = self.slots.lock();
        let idle = slots
            .get(event_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            slots.remove(event_id);
        }
    }
}

impl Drop for EventGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        self.locks.forget_if_idle(&self.event_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    #[test]
    fn second_acquire_times_out_while_held() {
        let locks = EventLocks::new();
        let event_id = EventId::generate();
        let _guard = locks.acquire(&event_id, Duration::from_millis(10)).unwrap();
        let err = locks
            .acquire(&event_id, Duration::from_millis(20))
            .err()
            .unwrap();
        assert!(matches!(err, TurnoutError::Unavailable { .. }));
    }

    #[test]
    fn different_events_do_not_contend() {
        let locks = EventLocks::new();
        let _a = locks
            .acquire(&EventId::generate(), Duration::from_millis(10))
            .unwrap();
        let _b = locks
            .acquire(&EventId::generate(), Duration::from_millis(10))
            .unwrap();
        assert_eq!(locks.active(), 2);
    }

    #[test]
    fn released_entries_are_dropped() {
        let locks = EventLocks::new();
        let event_id = EventId::generate();
        drop(locks.acquire(&event_id, Duration::from_millis(10)).unwrap());
        assert_eq!(locks.active(), 0);
        drop(locks.acquire(&event_id, Duration::from_millis(10)).unwrap());
    }

    #[test]
    fn waiter_gets_the_event_once_released() {
        let locks = EventLocks::new();
        let event_id = EventId::generate();
        let (taken, wait_taken) = std::sync::mpsc::channel();
        let holder = {
            let locks = locks.clone();
            let event_id = event_id.clone();
            thread::spawn(move || {
                let _guard = locks.acquire(&event_id, Duration::from_millis(10)).unwrap();
                taken.send(()).unwrap();
                thread::sleep(Duration::from_millis(30));
            })
        };
        wait_taken.recv().unwrap();
        let second = locks.acquire(&event_id, Duration::from_secs(5));
        holder.join().unwrap();
        assert!(second.is_ok());
        drop(second);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn timed_out_waiter_leaves_no_entry_behind() {
        let locks = EventLocks::new();
        let event_id = EventId::generate();
        let guard = locks.acquire(&event_id, Duration::from_millis(10)).unwrap();
        assert!(locks.acquire(&event_id, Duration::from_millis(5)).is_err());
        assert_eq!(locks.active(), 1);
        drop(guard);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn serializes_critical_sections() {
        let locks = EventLocks::new();
        let event_id = EventId::generate();
        let inside = Arc::new(AtomicU32::new(0));
        let overlaps = Arc::new(AtomicU32::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let event_id = event_id.clone();
                let inside = Arc::clone(&inside);
                let overlaps = Arc::clone(&overlaps);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _guard = locks.acquire(&event_id, Duration::from_secs(5)).unwrap();
                        if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert_eq!(locks.active(), 0);
    }
}
