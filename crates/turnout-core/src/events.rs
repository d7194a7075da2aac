use crate::error::TurnoutError;
use crate::types::{CreateEventInput, Event, EventId, EventStatus, RsvpCounts};

pub trait EventRepository {
    fn create(&self, input: CreateEventInput) -> Result<Event, TurnoutError>;
    fn get(&self, id: &EventId) -> Result<Option<Event>, TurnoutError>;
    fn set_counts(&self, id: &EventId, counts: &RsvpCounts) -> Result<(), TurnoutError>;
    fn set_capacity(&self, id: &EventId, max_attendees: u32) -> Result<Event, TurnoutError>;
    fn set_status(&self, id: &EventId, status: EventStatus) -> Result<Event, TurnoutError>;
}
