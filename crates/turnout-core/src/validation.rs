use crate::error::{AttendeeError, EventError};
use crate::types::{Caller, Event, EventStatus, PageRequest, UserId};
use chrono::{DateTime, Utc};

pub fn validate_guest_count(value: i64) -> Result<u32, AttendeeError> {
    if value < 0 {
        return Err(AttendeeError::InvalidInput {
            message: format!("guest count must not be negative, got {value}"),
        });
    }
    u32::try_from(value)
        .ok()
        .filter(|count| *count < u32::MAX)
        .ok_or_else(|| AttendeeError::InvalidInput {
            message: format!("guest count too large: {value}"),
        })
}

pub fn validate_page(page: &PageRequest, max_limit: u32) -> Result<(), AttendeeError> {
    if page.page == 0 {
        return Err(AttendeeError::InvalidInput {
            message: "page starts at 1".to_string(),
        });
    }
    if page.limit == 0 || page.limit > max_limit {
        return Err(AttendeeError::InvalidInput {
            message: format!("limit must be between 1 and {max_limit}"),
        });
    }
    Ok(())
}

pub fn validate_schedule(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), EventError> {
    if end <= start {
        return Err(EventError::InvalidInput {
            message: "end time must be after start time".to_string(),
        });
    }
    Ok(())
}

/// RSVP-changing operations are only allowed before the event is over.
pub fn ensure_accepting_rsvps(event: &Event, now: DateTime<Utc>) -> Result<(), EventError> {
    match event.status {
        EventStatus::Cancelled => Err(EventError::Cancelled),
        EventStatus::Ended => Err(EventError::Ended),
        EventStatus::Scheduled | EventStatus::Live if event.end_time <= now => {
            Err(EventError::Ended)
        }
        EventStatus::Scheduled | EventStatus::Live => Ok(()),
    }
}

pub fn ensure_organizer(
    event: &Event,
    caller: &Caller,
    action: &'static str,
) -> Result<(), EventError> {
    if caller.admin || event.is_organizer(&caller.user_id) {
        Ok(())
    } else {
        Err(EventError::Forbidden { action })
    }
}

pub fn ensure_can_remove(
    event: &Event,
    caller: &Caller,
    user_id: &UserId,
) -> Result<(), AttendeeError> {
    if &caller.user_id == user_id || caller.admin || event.is_organizer(&caller.user_id) {
        Ok(())
    } else {
        Err(AttendeeError::Forbidden {
            action: "remove attendee",
        })
    }
}

pub fn validate_status_transition(from: EventStatus, to: EventStatus) -> Result<(), EventError> {
    use EventStatus::{Cancelled, Ended, Live, Scheduled};

    if from == to {
        return Ok(());
    }

    let valid = matches!(
        (from, to),
        (Scheduled, Live | Ended | Cancelled) | (Live, Ended | Cancelled)
    );

    if valid {
        Ok(())
    } else {
        Err(EventError::InvalidTransition { from, to })
    }
}
