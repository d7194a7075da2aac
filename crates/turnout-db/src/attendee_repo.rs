use crate::util::{decode_enum, decode_id, encode_enum, from_rfc3339, sql, to_rfc3339};
use rusqlite::Connection;
use rusqlite::types::Value;
use turnout_core::attendees::AttendeeRepository;
use turnout_core::error::TurnoutError;
use turnout_core::types::{Attendee, AttendeeFilter, EventId, PageRequest, RsvpStatus, UserId};

const ATTENDEE_COLUMNS: &str = "event_id, user_id, rsvp, guest_count, is_waitlisted, waitlist_position, checked_in, rsvp_timestamp, created_at";
const WAITLIST_ORDER: &str = "waitlist_position ASC, rsvp_timestamp ASC, user_id ASC";

pub struct AttendeeRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> AttendeeRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql_text: &str, params: Vec<Value>) -> Result<Vec<Attendee>, TurnoutError> {
        let mut stmt = self.conn.prepare(sql_text).map_err(sql)?;
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params))
            .map_err(sql)?;
        let mut attendees = Vec::new();
        while let Some(row) = rows.next().map_err(sql)? {
            attendees.push(map_attendee_row(row)?);
        }
        Ok(attendees)
    }

    fn count_where(&self, clause: &str, params: Vec<Value>) -> Result<u64, TurnoutError> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM attendees WHERE {clause}"),
                rusqlite::params_from_iter(params),
                |row| row.get(0),
            )
            .map_err(sql)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn filter_clause(
    event_id: &EventId,
    filter: &AttendeeFilter,
) -> Result<(String, Vec<Value>), TurnoutError> {
    let mut clause = "event_id = ?1".to_string();
    let mut params = vec![Value::from(event_id.to_string())];
    if let Some(rsvp) = filter.rsvp {
        params.push(Value::from(encode_enum(&rsvp)?));
        clause.push_str(&format!(" AND rsvp = ?{}", params.len()));
    }
    if let Some(waitlisted) = filter.waitlisted {
        params.push(Value::from(waitlisted));
        clause.push_str(&format!(" AND is_waitlisted = ?{}", params.len()));
    }
    Ok((clause, params))
}

fn push_page(clause: &mut String, params: &mut Vec<Value>, page: &PageRequest) {
    params.push(Value::from(i64::from(page.limit)));
    clause.push_str(&format!(" LIMIT ?{}", params.len()));
    params.push(Value::from(i64::try_from(page.offset()).unwrap_or(i64::MAX)));
    clause.push_str(&format!(" OFFSET ?{}", params.len()));
}

impl AttendeeRepository for AttendeeRepo<'_> {
    fn get(&self, event_id: &EventId, user_id: &UserId) -> Result<Option<Attendee>, TurnoutError> {
        let found = self.query(
            &format!("SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE event_id = ?1 AND user_id = ?2"),
            vec![
                Value::from(event_id.to_string()),
                Value::from(user_id.to_string()),
            ],
        )?;
        Ok(found.into_iter().next())
    }

    fn upsert(&self, attendee: &Attendee) -> Result<(), TurnoutError> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO attendees ({ATTENDEE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                     ON CONFLICT(event_id, user_id) DO UPDATE SET \
                     rsvp = excluded.rsvp, guest_count = excluded.guest_count, \
                     is_waitlisted = excluded.is_waitlisted, waitlist_position = excluded.waitlist_position, \
                     checked_in = excluded.checked_in, rsvp_timestamp = excluded.rsvp_timestamp"
                ),
                rusqlite::params![
                    attendee.event_id.as_str(),
                    attendee.user_id.as_str(),
                    encode_enum(&attendee.rsvp)?,
                    attendee.guest_count,
                    attendee.is_waitlisted,
                    attendee.waitlist_position,
                    attendee.checked_in,
                    to_rfc3339(&attendee.rsvp_timestamp),
                    to_rfc3339(&attendee.created_at),
                ],
            )
            .map_err(sql)?;
        Ok(())
    }

    fn delete(&self, event_id: &EventId, user_id: &UserId) -> Result<bool, TurnoutError> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM attendees WHERE event_id = ?1 AND user_id = ?2",
                [event_id.as_str(), user_id.as_str()],
            )
            .map_err(sql)?;
        Ok(changed > 0)
    }

    fn list(
        &self,
        event_id: &EventId,
        filter: &AttendeeFilter,
        page: &PageRequest,
    ) -> Result<Vec<Attendee>, TurnoutError> {
        let (mut clause, mut params) = filter_clause(event_id, filter)?;
        clause.push_str(" ORDER BY rsvp_timestamp ASC, user_id ASC");
        push_page(&mut clause, &mut params, page);
        self.query(
            &format!("SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE {clause}"),
            params,
        )
    }

    fn count(&self, event_id: &EventId, filter: &AttendeeFilter) -> Result<u64, TurnoutError> {
        let (clause, params) = filter_clause(event_id, filter)?;
        self.count_where(&clause, params)
    }

    fn all(&self, event_id: &EventId) -> Result<Vec<Attendee>, TurnoutError> {
        self.query(
            &format!(
                "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE event_id = ?1 ORDER BY rsvp_timestamp ASC, user_id ASC"
            ),
            vec![Value::from(event_id.to_string())],
        )
    }

    fn waitlist(&self, event_id: &EventId) -> Result<Vec<Attendee>, TurnoutError> {
        self.query(
            &format!(
                "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE event_id = ?1 AND is_waitlisted = 1 ORDER BY {WAITLIST_ORDER}"
            ),
            vec![Value::from(event_id.to_string())],
        )
    }

    fn waitlist_page(
        &self,
        event_id: &EventId,
        page: &PageRequest,
    ) -> Result<Vec<Attendee>, TurnoutError> {
        let mut clause = format!("event_id = ?1 AND is_waitlisted = 1 ORDER BY {WAITLIST_ORDER}");
        let mut params = vec![Value::from(event_id.to_string())];
        push_page(&mut clause, &mut params, page);
        self.query(
            &format!("SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE {clause}"),
            params,
        )
    }

    fn waitlist_head(&self, event_id: &EventId) -> Result<Option<Attendee>, TurnoutError> {
        let head = self.query(
            &format!(
                "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE event_id = ?1 AND is_waitlisted = 1 ORDER BY {WAITLIST_ORDER} LIMIT 1"
            ),
            vec![Value::from(event_id.to_string())],
        )?;
        Ok(head.into_iter().next())
    }

    fn waitlist_len(&self, event_id: &EventId) -> Result<u32, TurnoutError> {
        let len = self.count_where(
            "event_id = ?1 AND is_waitlisted = 1",
            vec![Value::from(event_id.to_string())],
        )?;
        Ok(u32::try_from(len).unwrap_or(u32::MAX))
    }

    fn set_waitlist_position(
        &self,
        event_id: &EventId,
        user_id: &UserId,
        position: u32,
    ) -> Result<(), TurnoutError> {
        self.conn
            .execute(
                "UPDATE attendees SET waitlist_position = ?3 WHERE event_id = ?1 AND user_id = ?2 AND is_waitlisted = 1",
                rusqlite::params![event_id.as_str(), user_id.as_str(), position],
            )
            .map_err(sql)?;
        Ok(())
    }

    fn occupied(
        &self,
        event_id: &EventId,
        exclude: Option<&UserId>,
    ) -> Result<u32, TurnoutError> {
        let total: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(SUM(1 + guest_count), 0) FROM attendees \
                 WHERE event_id = ?1 AND rsvp = ?2 AND is_waitlisted = 0 \
                 AND (?3 IS NULL OR user_id <> ?3)",
                rusqlite::params![
                    event_id.as_str(),
                    encode_enum(&RsvpStatus::Going)?,
                    exclude.map(UserId::as_str),
                ],
                |row| row.get(0),
            )
            .map_err(sql)?;
        Ok(u32::try_from(total).unwrap_or(u32::MAX))
    }
}

fn map_attendee_row(row: &rusqlite::Row<'_>) -> Result<Attendee, TurnoutError> {
    let event_id: String = row.get(0).map_err(sql)?;
    let user_id: String = row.get(1).map_err(sql)?;
    let rsvp: String = row.get(2).map_err(sql)?;
    let rsvp_timestamp: String = row.get(7).map_err(sql)?;
    let created_at: String = row.get(8).map_err(sql)?;

    Ok(Attendee {
        event_id: decode_id(&event_id)?,
        user_id: decode_id(&user_id)?,
        rsvp: decode_enum(&rsvp)?,
        guest_count: row.get(3).map_err(sql)?,
        is_waitlisted: row.get(4).map_err(sql)?,
        waitlist_position: row.get(5).map_err(sql)?,
        checked_in: row.get(6).map_err(sql)?,
        rsvp_timestamp: from_rfc3339(&rsvp_timestamp)?,
        created_at: from_rfc3339(&created_at)?,
    })
}
