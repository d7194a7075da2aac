use crate::types::attendee::Attendee;
use crate::types::enums::RsvpStatus;
use crate::types::event::RsvpCounts;
use crate::types::ids::{EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventInput {
    pub host_id: UserId,
    #[serde(default)]
    pub co_hosts: Vec<UserId>,
    pub title: String,
    #[serde(default)]
    pub max_attendees: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Requested RSVP. `guest_count` is signed because callers forward it from
/// untyped payloads; negative values are rejected as invalid arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRsvpInput {
    pub rsvp: RsvpStatus,
    #[serde(default)]
    pub guest_count: i64,
}

impl SubmitRsvpInput {
    pub fn new(rsvp: RsvpStatus, guest_count: i64) -> Self {
        Self { rsvp, guest_count }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeFilter {
    pub rsvp: Option<RsvpStatus>,
    pub waitlisted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeePage {
    pub items: Vec<Attendee>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub event_id: EventId,
    pub before: RsvpCounts,
    pub after: RsvpCounts,
    pub positions_repaired: u32,
}

impl ReconcileReport {
    pub fn drifted(&self) -> bool {
        self.before != self.after || self.positions_repaired > 0
    }
}

/// Who is asking. Identity is established upstream; only the permission
/// decision happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    #[serde(default)]
    pub admin: bool,
}

impl Caller {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }
}
