use crate::types::enums::EventStatus;
use crate::types::ids::{EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub host_id: UserId,
    pub co_hosts: Vec<UserId>,
    pub title: String,
    /// People, not records. `0` means unlimited.
    pub max_attendees: u32,
    pub status: EventStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub rsvp_counts: RsvpCounts,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_unlimited(&self) -> bool {
        self.max_attendees == 0
    }

    pub fn is_organizer(&self, user_id: &UserId) -> bool {
        &self.host_id == user_id || self.co_hosts.contains(user_id)
    }
}

/// Aggregate RSVP counters kept on the event record.
///
/// `going` counts people (`1 + guest_count` per admitted record), every
/// other bucket counts attendee records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpCounts {
    pub going: u32,
    pub interested: u32,
    pub not_going: u32,
    pub no_reply: u32,
    pub waitlist: u32,
}
