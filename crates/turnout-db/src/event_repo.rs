use crate::util::{decode_enum, decode_id, decode_json, encode_enum, encode_json, from_rfc3339, sql, to_rfc3339};
use chrono::Utc;
use rusqlite::Connection;
use turnout_core::error::{EventError, TurnoutError};
use turnout_core::events::EventRepository;
use turnout_core::types::{CreateEventInput, Event, EventId, EventStatus, RsvpCounts};

const EVENT_COLUMNS: &str = "id, host_id, co_hosts_json, title, max_attendees, status, start_time, end_time, going_count, interested_count, not_going_count, no_reply_count, waitlist_count, created_at, updated_at";

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn require(&self, id: &EventId) -> Result<Event, TurnoutError> {
        self.get(id)?.ok_or_else(|| EventError::NotFound.into())
    }
}

impl EventRepository for EventRepo<'_> {
    fn create(&self, input: CreateEventInput) -> Result<Event, TurnoutError> {
        let now = Utc::now();
        let event = Event {
            id: EventId::generate(),
            host_id: input.host_id,
            co_hosts: input.co_hosts,
            title: input.title,
            max_attendees: input.max_attendees,
            status: EventStatus::Scheduled,
            start_time: input.start_time,
            end_time: input.end_time,
            rsvp_counts: RsvpCounts::default(),
            created_at: now,
            updated_at: now,
        };
        self.conn
            .execute(
                &format!(
                    "INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 0, 0, 0, 0, ?9, ?9)"
                ),
                rusqlite::params![
                    event.id.as_str(),
                    event.host_id.as_str(),
                    encode_json(&event.co_hosts)?,
                    event.title,
                    event.max_attendees,
                    encode_enum(&event.status)?,
                    to_rfc3339(&event.start_time),
                    to_rfc3339(&event.end_time),
                    to_rfc3339(&now),
                ],
            )
            .map_err(sql)?;
        Ok(event)
    }

    fn get(&self, id: &EventId) -> Result<Option<Event>, TurnoutError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"))
            .map_err(sql)?;
        let mut rows = stmt.query([id.as_str()]).map_err(sql)?;
        match rows.next().map_err(sql)? {
            Some(row) => Ok(Some(map_event_row(row)?)),
            None => Ok(None),
        }
    }

    fn set_counts(&self, id: &EventId, counts: &RsvpCounts) -> Result<(), TurnoutError> {
        let changed = self
            .conn
            .execute(
                "UPDATE events SET going_count = ?2, interested_count = ?3, not_going_count = ?4, no_reply_count = ?5, waitlist_count = ?6, updated_at = ?7 WHERE id = ?1",
                rusqlite::params![
                    id.as_str(),
                    counts.going,
                    counts.interested,
                    counts.not_going,
                    counts.no_reply,
                    counts.waitlist,
                    to_rfc3339(&Utc::now()),
                ],
            )
            .map_err(sql)?;
        if changed == 0 {
            return Err(EventError::NotFound.into());
        }
        Ok(())
    }

    fn set_capacity(&self, id: &EventId, max_attendees: u32) -> Result<Event, TurnoutError> {
        let changed = self
            .conn
            .execute(
                "UPDATE events SET max_attendees = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id.as_str(), max_attendees, to_rfc3339(&Utc::now())],
            )
            .map_err(sql)?;
        if changed == 0 {
            return Err(EventError::NotFound.into());
        }
        self.require(id)
    }

    fn set_status(&self, id: &EventId, status: EventStatus) -> Result<Event, TurnoutError> {
        let changed = self
            .conn
            .execute(
                "UPDATE events SET status = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id.as_str(), encode_enum(&status)?, to_rfc3339(&Utc::now())],
            )
            .map_err(sql)?;
        if changed == 0 {
            return Err(EventError::NotFound.into());
        }
        self.require(id)
    }
}

fn map_event_row(row: &rusqlite::Row<'_>) -> Result<Event, TurnoutError> {
    let id: String = row.get(0).map_err(sql)?;
    let host_id: String = row.get(1).map_err(sql)?;
    let co_hosts_json: String = row.get(2).map_err(sql)?;
    let status: String = row.get(5).map_err(sql)?;
    let start_time: String = row.get(6).map_err(sql)?;
    let end_time: String = row.get(7).map_err(sql)?;
    let created_at: String = row.get(13).map_err(sql)?;
    let updated_at: String = row.get(14).map_err(sql)?;

    Ok(Event {
        id: decode_id(&id)?,
        host_id: decode_id(&host_id)?,
        co_hosts: decode_json(&co_hosts_json)?,
        title: row.get(3).map_err(sql)?,
        max_attendees: row.get(4).map_err(sql)?,
        status: decode_enum(&status)?,
        start_time: from_rfc3339(&start_time)?,
        end_time: from_rfc3339(&end_time)?,
        rsvp_counts: RsvpCounts {
            going: row.get(8).map_err(sql)?,
            interested: row.get(9).map_err(sql)?,
            not_going: row.get(10).map_err(sql)?,
            no_reply: row.get(11).map_err(sql)?,
            waitlist: row.get(12).map_err(sql)?,
        },
        created_at: from_rfc3339(&created_at)?,
        updated_at: from_rfc3339(&updated_at)?,
    })
}
