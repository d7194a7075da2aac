pub mod attendee;
pub mod enums;
pub mod event;
pub mod ids;
pub mod io;
pub mod notification;

pub use attendee::Attendee;
pub use enums::{EventStatus, RsvpStatus};
pub use event::{Event, RsvpCounts};
pub use ids::{EventId, IdError, UserId};
pub use io::{
    AttendeeFilter, AttendeePage, Caller, CreateEventInput, PageRequest, ReconcileReport,
    SubmitRsvpInput,
};
pub use notification::NotificationBody;
