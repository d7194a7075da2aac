use crate::attendees::AttendeeRepository;
use crate::error::TurnoutError;
use crate::events::EventRepository;
use crate::notifications::NotificationRepository;

/// Access to the external Event and Attendee stores plus the notification
/// outbox. `with_tx` must make everything done through the closure commit or
/// roll back as one unit.
pub trait Store {
    type Events<'a>: EventRepository
    where
        Self: 'a;
    type Attendees<'a>: AttendeeRepository
    where
        Self: 'a;
    type Notifications<'a>: NotificationRepository
    where
        Self: 'a;

    fn events(&self) -> Self::Events<'_>;
    fn attendees(&self) -> Self::Attendees<'_>;
    fn notifications(&self) -> Self::Notifications<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, TurnoutError>
    where
        F: FnOnce(&Self) -> Result<T, TurnoutError>;
}
