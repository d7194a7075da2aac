use crate::types::enums::RsvpStatus;
use crate::types::ids::{EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub event_id: EventId,
    pub user_id: UserId,
    pub rsvp: RsvpStatus,
    pub guest_count: u32,
    pub is_waitlisted: bool,
    /// 1-based queue rank while waitlisted, `0` otherwise.
    pub waitlist_position: u32,
    pub checked_in: bool,
    pub rsvp_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Attendee {
    pub fn new(event_id: EventId, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            event_id,
            user_id,
            rsvp: RsvpStatus::NoReply,
            guest_count: 0,
            is_waitlisted: false,
            waitlist_position: 0,
            checked_in: false,
            rsvp_timestamp: at,
            created_at: at,
        }
    }

    pub fn party_size(&self) -> u32 {
        self.guest_count.saturating_add(1)
    }

    /// Whether this record occupies capacity right now.
    pub fn holds_capacity(&self) -> bool {
        self.rsvp == RsvpStatus::Going && !self.is_waitlisted
    }

    pub fn admitted_weight(&self) -> u32 {
        if self.holds_capacity() {
            self.party_size()
        } else {
            0
        }
    }

    pub(crate) fn leave_waitlist(&mut self) {
        self.is_waitlisted = false;
        self.waitlist_position = 0;
    }
}
