//! Keeps the aggregate RSVP counters on the event record in step with
//! individual attendee transitions.

use crate::error::TurnoutError;
use crate::events::EventRepository;
use crate::store::Store;
use crate::types::{Attendee, Event, RsvpCounts, RsvpStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Going,
    Interested,
    NotGoing,
    NoReply,
    Waitlist,
}

/// The part of an attendee record the counters care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub status: RsvpStatus,
    pub waitlisted: bool,
    pub guest_count: u32,
}

impl Slot {
    pub fn of(attendee: &Attendee) -> Self {
        Self {
            status: attendee.rsvp,
            waitlisted: attendee.is_waitlisted,
            guest_count: attendee.guest_count,
        }
    }

    pub fn bucket(&self) -> Bucket {
        if self.waitlisted {
            return Bucket::Waitlist;
        }
        match self.status {
            RsvpStatus::Going => Bucket::Going,
            RsvpStatus::Interested => Bucket::Interested,
            RsvpStatus::NotGoing => Bucket::NotGoing,
            RsvpStatus::NoReply => Bucket::NoReply,
        }
    }

    /// Admitted `going` records weigh their party size; every other bucket
    /// counts records.
    pub fn weight(&self) -> u32 {
        match self.bucket() {
            Bucket::Going => self.guest_count.saturating_add(1),
            _ => 1,
        }
    }
}

fn bucket_mut(counts: &mut RsvpCounts, bucket: Bucket) -> &mut u32 {
    match bucket {
        Bucket::Going => &mut counts.going,
        Bucket::Interested => &mut counts.interested,
        Bucket::NotGoing => &mut counts.not_going,
        Bucket::NoReply => &mut counts.no_reply,
        Bucket::Waitlist => &mut counts.waitlist,
    }
}

/// Moves one attendee's weight from the bucket of `from` to the bucket of
/// `to`. `None` on either side means the record did not exist / no longer
/// exists.
///
/// Decrements are floored at zero. Returns `true` when a floor was hit,
/// which means the counters had already drifted from the records.
pub fn apply_transition(counts: &mut RsvpCounts, from: Option<Slot>, to: Option<Slot>) -> bool {
    if from == to {
        return false;
    }
    let mut clamped = false;
    if let Some(slot) = from {
        let counter = bucket_mut(counts, slot.bucket());
        let weight = slot.weight();
        if *counter < weight {
            clamped = true;
        }
        *counter = counter.saturating_sub(weight);
    }
    if let Some(slot) = to {
        let counter = bucket_mut(counts, slot.bucket());
        *counter = counter.saturating_add(slot.weight());
    }
    clamped
}

/// Applies a transition to `event.rsvp_counts` and writes the counters back.
/// Callers hold the per-event lock and an open transaction.
pub fn sync<S: Store>(
    store: &S,
    event: &mut Event,
    from: Option<Slot>,
    to: Option<Slot>,
) -> Result<(), TurnoutError> {
    if from == to {
        return Ok(());
    }
    if apply_transition(&mut event.rsvp_counts, from, to) {
        tracing::warn!(
            event_id = %event.id,
            ?from,
            "rsvp counter underflow clamped to zero"
        );
    }
    store.events().set_counts(&event.id, &event.rsvp_counts)
}

/// Counters as they should be for the given records.
pub fn recompute<'a>(attendees: impl IntoIterator<Item = &'a Attendee>) -> RsvpCounts {
    let mut counts = RsvpCounts::default();
    for attendee in attendees {
        apply_transition(&mut counts, None, Some(Slot::of(attendee)));
    }
    counts
}
