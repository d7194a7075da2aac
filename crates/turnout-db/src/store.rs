use crate::attendee_repo::AttendeeRepo;
use crate::event_repo::EventRepo;
use crate::notification_repo::NotificationRepo;
use crate::schema;
use crate::util::sql;
use rusqlite::Connection;
use std::time::Duration;
use turnout_core::error::TurnoutError;
use turnout_core::store::Store;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (creating if needed) and migrates the database at `path`.
    pub fn open(path: &str, busy_timeout: Duration) -> Result<Self, TurnoutError> {
        schema::open_and_migrate(path, busy_timeout)
            .map(Self::new)
            .map_err(sql)
    }

    pub fn in_memory() -> Result<Self, TurnoutError> {
        schema::with_test_db().map(Self::new).map_err(sql)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for DbStore {
    type Events<'a>
        = EventRepo<'a>
    where
        Self: 'a;
    type Attendees<'a>
        = AttendeeRepo<'a>
    where
        Self: 'a;
    type Notifications<'a>
        = NotificationRepo<'a>
    where
        Self: 'a;

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(&self.conn)
    }

    fn attendees(&self) -> Self::Attendees<'_> {
        AttendeeRepo::new(&self.conn)
    }

    fn notifications(&self) -> Self::Notifications<'_> {
        NotificationRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, TurnoutError>
    where
        F: FnOnce(&Self) -> Result<T, TurnoutError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(sql)?;
        match f(self) {
            Ok(value) => {
                if let Err(err) = self.conn.execute_batch("COMMIT") {
                    tracing::warn!(error = %err, "commit failed, rolling back");
                    // A failed COMMIT can leave the transaction open.
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(sql(err));
                }
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "transaction rolled back");
                self.conn.execute_batch("ROLLBACK").map_err(sql)?;
                Err(err)
            }
        }
    }
}
