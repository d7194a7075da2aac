//! Admission engine: classifies RSVP changes against capacity and applies
//! them, together with the counter and waitlist bookkeeping they imply.
//!
//! The functions taking a `Store` expect to run inside the per-event lock
//! and an open transaction. They return the notification bodies the change
//! produced; the caller appends them to the outbox.

use crate::attendees::AttendeeRepository;
use crate::counters::{self, Slot};
use crate::error::{AttendeeError, EventError, TurnoutError};
use crate::events::EventRepository;
use crate::notify;
use crate::store::Store;
use crate::types::{
    Attendee, Caller, Event, EventId, NotificationBody, RsvpStatus, SubmitRsvpInput, UserId,
};
use crate::validation::{
    ensure_accepting_rsvps, ensure_can_remove, ensure_organizer, validate_guest_count,
};
use crate::waitlist;
use chrono::{DateTime, Utc};

/// Whether a party of `weight` fits next to `occupied`. `max == 0` means
/// unlimited.
pub fn fits(max: u32, occupied: u32, weight: u32) -> bool {
    max == 0 || occupied.saturating_add(weight) <= max
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Takes effect without touching the queue. Leaves it if the record
    /// was waitlisted under a non-going status change.
    Admit,
    /// A waitlisted `going` record that now fits.
    Promote,
    /// Appended to the tail of the queue.
    Waitlist,
    /// Already queued and still does not fit; position is kept.
    StayWaitlisted,
}

/// Decides the outcome of setting `rsvp`/`guest_count` on top of `prior`.
///
/// `occupied_by_others` is the admitted party total excluding the caller's
/// own record.
pub fn decide(
    event: &Event,
    prior: Option<&Attendee>,
    rsvp: RsvpStatus,
    guest_count: u32,
    occupied_by_others: u32,
) -> Result<Admission, AttendeeError> {
    if rsvp != RsvpStatus::Going {
        return Ok(Admission::Admit);
    }

    let weight = guest_count.saturating_add(1);
    let room = fits(event.max_attendees, occupied_by_others, weight);
    match prior {
        Some(prior) if prior.is_waitlisted => {
            if prior.guest_count != guest_count {
                return Err(AttendeeError::WaitlistedGuestChange);
            }
            Ok(if room {
                Admission::Promote
            } else {
                Admission::StayWaitlisted
            })
        }
        Some(prior) if prior.holds_capacity() => {
            // Only growth is capacity-checked; an admitted party is never
            // pushed back onto the queue by an edit.
            if weight > prior.party_size() && !room {
                return Err(capacity_exceeded(event, occupied_by_others, weight));
            }
            Ok(Admission::Admit)
        }
        _ => Ok(if room {
            Admission::Admit
        } else {
            Admission::Waitlist
        }),
    }
}

fn capacity_exceeded(event: &Event, occupied: u32, requested: u32) -> AttendeeError {
    AttendeeError::CapacityExceeded {
        requested,
        available: event.max_attendees.saturating_sub(occupied),
    }
}

fn load_event<S: Store>(store: &S, event_id: &EventId) -> Result<Event, TurnoutError> {
    store
        .events()
        .get(event_id)?
        .ok_or_else(|| EventError::NotFound.into())
}

fn occupied_by_others<S: Store>(
    store: &S,
    event: &Event,
    user_id: &UserId,
) -> Result<u32, TurnoutError> {
    if event.is_unlimited() {
        return Ok(0);
    }
    store.attendees().occupied(&event.id, Some(user_id))
}

pub fn submit<S: Store>(
    store: &S,
    event_id: &EventId,
    user_id: &UserId,
    input: &SubmitRsvpInput,
    now: DateTime<Utc>,
) -> Result<(Attendee, Vec<NotificationBody>), TurnoutError> {
    let guest_count = validate_guest_count(input.guest_count)?;
    let mut event = load_event(store, event_id)?;
    ensure_accepting_rsvps(&event, now)?;

    let guest_count = if input.rsvp == RsvpStatus::Going {
        guest_count
    } else {
        0
    };
    let prior = store.attendees().get(event_id, user_id)?;
    let occupied = occupied_by_others(store, &event, user_id)?;
    let admission = decide(&event, prior.as_ref(), input.rsvp, guest_count, occupied)?;
    tracing::debug!(
        event_id = %event_id,
        user_id = %user_id,
        rsvp = %input.rsvp,
        guest_count,
        occupied,
        max = event.max_attendees,
        ?admission,
        "rsvp classified"
    );

    let mut updated = prior
        .clone()
        .unwrap_or_else(|| Attendee::new(event_id.clone(), user_id.clone(), now));
    updated.rsvp = input.rsvp;
    updated.guest_count = guest_count;
    updated.rsvp_timestamp = now;
    match admission {
        Admission::Admit | Admission::Promote => updated.leave_waitlist(),
        Admission::Waitlist => {
            updated.is_waitlisted = true;
            updated.waitlist_position = waitlist::next_position(store, event_id)?;
        }
        Admission::StayWaitlisted => {}
    }
    store.attendees().upsert(&updated)?;
    counters::sync(
        store,
        &mut event,
        prior.as_ref().map(Slot::of),
        Some(Slot::of(&updated)),
    )?;

    let mut bodies = notify::for_rsvp(&event, prior.as_ref(), &updated, admission);
    let released = prior.as_ref().map_or(0, Attendee::admitted_weight);
    let left_queue =
        prior.as_ref().is_some_and(|prior| prior.is_waitlisted) && !updated.is_waitlisted;
    if left_queue {
        waitlist::reindex(store, event_id)?;
    }
    // A departed head may have been the only thing blocking the queue.
    if left_queue || released > updated.admitted_weight() {
        bodies.extend(notify::promoted(waitlist::promote(store, &mut event)?));
    }
    Ok((updated, bodies))
}

pub fn update_guest_count<S: Store>(
    store: &S,
    event_id: &EventId,
    user_id: &UserId,
    guest_count: i64,
    now: DateTime<Utc>,
) -> Result<((), Vec<NotificationBody>), TurnoutError> {
    let guest_count = validate_guest_count(guest_count)?;
    let mut event = load_event(store, event_id)?;
    ensure_accepting_rsvps(&event, now)?;
    let prior = store
        .attendees()
        .get(event_id, user_id)?
        .ok_or(AttendeeError::NotFound)?;
    if prior.is_waitlisted {
        return Err(AttendeeError::WaitlistedGuestChange.into());
    }
    if prior.rsvp != RsvpStatus::Going {
        return Err(AttendeeError::NotGoing.into());
    }
    if prior.guest_count == guest_count {
        return Ok(((), Vec::new()));
    }

    let weight = guest_count.saturating_add(1);
    if guest_count > prior.guest_count {
        let occupied = occupied_by_others(store, &event, user_id)?;
        if !fits(event.max_attendees, occupied, weight) {
            tracing::debug!(
                event_id = %event_id,
                user_id = %user_id,
                guest_count,
                occupied,
                max = event.max_attendees,
                "guest count change refused"
            );
            return Err(capacity_exceeded(&event, occupied, weight).into());
        }
    }

    let mut updated = prior.clone();
    updated.guest_count = guest_count;
    updated.rsvp_timestamp = now;
    store.attendees().upsert(&updated)?;
    counters::sync(
        store,
        &mut event,
        Some(Slot::of(&prior)),
        Some(Slot::of(&updated)),
    )?;

    let mut bodies = Vec::new();
    if guest_count < prior.guest_count {
        bodies.extend(notify::promoted(waitlist::promote(store, &mut event)?));
    }
    Ok(((), bodies))
}

pub fn remove<S: Store>(
    store: &S,
    event_id: &EventId,
    user_id: &UserId,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<((), Vec<NotificationBody>), TurnoutError> {
    let mut event = load_event(store, event_id)?;
    ensure_can_remove(&event, caller, user_id)?;
    let prior = store
        .attendees()
        .get(event_id, user_id)?
        .ok_or(AttendeeError::NotFound)?;

    store.attendees().delete(event_id, user_id)?;
    counters::sync(store, &mut event, Some(Slot::of(&prior)), None)?;
    tracing::info!(
        event_id = %event_id,
        user_id = %user_id,
        removed_by = %caller.user_id,
        waitlisted = prior.is_waitlisted,
        "attendee removed"
    );

    let mut bodies = vec![notify::removed(&prior, &caller.user_id)];
    if prior.is_waitlisted {
        waitlist::reindex(store, event_id)?;
    }
    // A closed event keeps its queue as it was.
    let frees_queue = prior.is_waitlisted || prior.holds_capacity();
    if frees_queue && ensure_accepting_rsvps(&event, now).is_ok() {
        bodies.extend(notify::promoted(waitlist::promote(store, &mut event)?));
    }
    Ok(((), bodies))
}

pub fn invite<S: Store>(
    store: &S,
    event_id: &EventId,
    user_id: &UserId,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<(Attendee, Vec<NotificationBody>), TurnoutError> {
    let mut event = load_event(store, event_id)?;
    ensure_organizer(&event, caller, "invite attendees")?;
    ensure_accepting_rsvps(&event, now)?;
    if store.attendees().get(event_id, user_id)?.is_some() {
        return Err(AttendeeError::AlreadyExists.into());
    }

    let attendee = Attendee::new(event_id.clone(), user_id.clone(), now);
    store.attendees().upsert(&attendee)?;
    counters::sync(store, &mut event, None, Some(Slot::of(&attendee)))?;
    Ok((
        attendee.clone(),
        vec![NotificationBody::Invited {
            attendee,
            invited_by: caller.user_id.clone(),
        }],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventStatus, RsvpCounts};

    fn event(max_attendees: u32) -> Event {
        let now = Utc::now();
        Event {
            id: EventId::generate(),
            host_id: UserId::generate(),
            co_hosts: Vec::new(),
            title: "Dinner".to_string(),
            max_attendees,
            status: EventStatus::Scheduled,
            start_time: now,
            end_time: now + chrono::Duration::hours(3),
            rsvp_counts: RsvpCounts::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn attendee(event: &Event, rsvp: RsvpStatus, guest_count: u32, position: u32) -> Attendee {
        let mut attendee = Attendee::new(event.id.clone(), UserId::generate(), Utc::now());
        attendee.rsvp = rsvp;
        attendee.guest_count = guest_count;
        attendee.is_waitlisted = position > 0;
        attendee.waitlist_position = position;
        attendee
    }

    #[test]
    fn fits_treats_zero_as_unlimited() {
        assert!(fits(0, 10_000, 50));
        assert!(fits(2, 1, 1));
        assert!(!fits(2, 1, 2));
        assert!(!fits(1, u32::MAX, 1));
    }

    #[test]
    fn new_party_that_overflows_is_waitlisted() {
        let event = event(2);
        assert_eq!(
            decide(&event, None, RsvpStatus::Going, 1, 1).unwrap(),
            Admission::Waitlist
        );
        assert_eq!(
            decide(&event, None, RsvpStatus::Going, 0, 1).unwrap(),
            Admission::Admit
        );
    }

    #[test]
    fn non_going_is_always_admitted() {
        let event = event(1);
        for status in [
            RsvpStatus::Interested,
            RsvpStatus::NotGoing,
            RsvpStatus::NoReply,
        ] {
            assert_eq!(
                decide(&event, None, status, 0, 5).unwrap(),
                Admission::Admit
            );
        }
    }

    #[test]
    fn admitted_growth_is_refused_not_waitlisted() {
        let event = event(1);
        let prior = attendee(&event, RsvpStatus::Going, 0, 0);
        let err = decide(&event, Some(&prior), RsvpStatus::Going, 1, 0).unwrap_err();
        assert!(matches!(
            err,
            AttendeeError::CapacityExceeded {
                requested: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn admitted_resubmission_is_never_refused() {
        // Capacity was lowered below the current head count.
        let event = event(1);
        let prior = attendee(&event, RsvpStatus::Going, 2, 0);
        assert_eq!(
            decide(&event, Some(&prior), RsvpStatus::Going, 2, 3).unwrap(),
            Admission::Admit
        );
        assert_eq!(
            decide(&event, Some(&prior), RsvpStatus::Going, 1, 3).unwrap(),
            Admission::Admit
        );
    }

    #[test]
    fn waitlisted_resubmission_keeps_or_promotes() {
        let event = event(2);
        let prior = attendee(&event, RsvpStatus::Going, 1, 1);
        assert_eq!(
            decide(&event, Some(&prior), RsvpStatus::Going, 1, 1).unwrap(),
            Admission::StayWaitlisted
        );
        assert_eq!(
            decide(&event, Some(&prior), RsvpStatus::Going, 1, 0).unwrap(),
            Admission::Promote
        );
        assert!(matches!(
            decide(&event, Some(&prior), RsvpStatus::Going, 0, 0),
            Err(AttendeeError::WaitlistedGuestChange)
        ));
    }

    #[test]
    fn waitlisted_user_leaving_going_is_admitted() {
        let event = event(2);
        let prior = attendee(&event, RsvpStatus::Going, 1, 3);
        assert_eq!(
            decide(&event, Some(&prior), RsvpStatus::NotGoing, 0, 2).unwrap(),
            Admission::Admit
        );
    }
}
