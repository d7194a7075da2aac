use crate::error::TurnoutError;
use turnout_events::NotificationIntent;

pub trait NotificationRepository {
    /// Appends to the outbox, assigning `id` and `seq`.
    fn append(&self, intent: NotificationIntent) -> Result<NotificationIntent, TurnoutError>;
    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<NotificationIntent>, TurnoutError>;
}
