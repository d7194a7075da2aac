use crate::error::TurnoutError;
use crate::types::{Attendee, AttendeeFilter, EventId, PageRequest, UserId};

pub trait AttendeeRepository {
    fn get(&self, event_id: &EventId, user_id: &UserId) -> Result<Option<Attendee>, TurnoutError>;
    /// Inserts or replaces the record keyed by `(event_id, user_id)`.
    fn upsert(&self, attendee: &Attendee) -> Result<(), TurnoutError>;
    fn delete(&self, event_id: &EventId, user_id: &UserId) -> Result<bool, TurnoutError>;
    /// Ordered by `rsvp_timestamp`, then `user_id`.
    fn list(
        &self,
        event_id: &EventId,
        filter: &AttendeeFilter,
        page: &PageRequest,
    ) -> Result<Vec<Attendee>, TurnoutError>;
    fn count(&self, event_id: &EventId, filter: &AttendeeFilter) -> Result<u64, TurnoutError>;
    fn all(&self, event_id: &EventId) -> Result<Vec<Attendee>, TurnoutError>;
    /// Waitlisted records ordered by `waitlist_position`, ties broken by
    /// `rsvp_timestamp` then `user_id`.
    fn waitlist(&self, event_id: &EventId) -> Result<Vec<Attendee>, TurnoutError>;
    fn waitlist_page(
        &self,
        event_id: &EventId,
        page: &PageRequest,
    ) -> Result<Vec<Attendee>, TurnoutError>;
    fn waitlist_head(&self, event_id: &EventId) -> Result<Option<Attendee>, TurnoutError>;
    fn waitlist_len(&self, event_id: &EventId) -> Result<u32, TurnoutError>;
    fn set_waitlist_position(
        &self,
        event_id: &EventId,
        user_id: &UserId,
        position: u32,
    ) -> Result<(), TurnoutError>;
    /// Sum of `1 + guest_count` over admitted `going` records, optionally
    /// leaving one user's contribution out.
    fn occupied(&self, event_id: &EventId, exclude: Option<&UserId>)
    -> Result<u32, TurnoutError>;
}
