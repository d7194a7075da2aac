//! FIFO waitlist: tail appends, head promotion and dense renumbering.
//!
//! Every function here runs inside the caller's per-event critical section
//! and transaction.

use crate::admission::fits;
use crate::attendees::AttendeeRepository;
use crate::counters::{self, Slot};
use crate::error::TurnoutError;
use crate::store::Store;
use crate::types::{Attendee, Event, EventId};

/// Position for a newcomer at the tail of the queue.
pub fn next_position<S: Store>(store: &S, event_id: &EventId) -> Result<u32, TurnoutError> {
    Ok(store.attendees().waitlist_len(event_id)? + 1)
}

/// Renumbers the remaining waitlisted records `1..=n` in their current
/// order. Returns how many positions had to change.
pub fn reindex<S: Store>(store: &S, event_id: &EventId) -> Result<u32, TurnoutError> {
    let entries = store.attendees().waitlist(event_id)?;
    let mut changed = 0;
    for (index, entry) in entries.iter().enumerate() {
        let position = u32::try_from(index + 1).map_err(|_| TurnoutError::Internal {
            message: "waitlist too long".to_string(),
        })?;
        if entry.waitlist_position != position {
            store
                .attendees()
                .set_waitlist_position(event_id, &entry.user_id, position)?;
            changed += 1;
        }
    }
    if changed > 0 {
        tracing::debug!(event_id = %event_id, changed, len = entries.len(), "waitlist reindexed");
    }
    Ok(changed)
}

/// Admits waitlisted parties from the head while the head fits.
///
/// Stops at the first head whose whole party does not fit, so a smaller
/// party further back never overtakes it. Returns the promoted records in
/// promotion order; the queue is reindexed if anything moved.
pub fn promote<S: Store>(store: &S, event: &mut Event) -> Result<Vec<Attendee>, TurnoutError> {
    let mut promoted = Vec::new();
    while let Some(head) = store.attendees().waitlist_head(&event.id)? {
        let occupied = if event.is_unlimited() {
            0
        } else {
            store.attendees().occupied(&event.id, None)?
        };
        if !fits(event.max_attendees, occupied, head.party_size()) {
            tracing::debug!(
                event_id = %event.id,
                user_id = %head.user_id,
                party = head.party_size(),
                occupied,
                max = event.max_attendees,
                "waitlist head does not fit"
            );
            break;
        }

        let mut admitted = head.clone();
        admitted.leave_waitlist();
        store.attendees().upsert(&admitted)?;
        counters::sync(store, event, Some(Slot::of(&head)), Some(Slot::of(&admitted)))?;
        tracing::info!(
            event_id = %event.id,
            user_id = %admitted.user_id,
            position = head.waitlist_position,
            party = admitted.party_size(),
            "promoted from waitlist"
        );
        promoted.push(admitted);
    }
    if !promoted.is_empty() {
        reindex(store, &event.id)?;
    }
    Ok(promoted)
}
