use crate::util::{decode_enum, decode_json, encode_enum, encode_json, from_rfc3339, sql, to_rfc3339};
use rusqlite::Connection;
use turnout_core::error::TurnoutError;
use turnout_core::notifications::NotificationRepository;
use turnout_events::NotificationIntent;
use ulid::Ulid;

pub struct NotificationRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> NotificationRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for NotificationRepo<'_> {
    fn append(&self, mut intent: NotificationIntent) -> Result<NotificationIntent, TurnoutError> {
        intent.seq = next_seq(self.conn)?;
        intent.id = format!("ntf_{}", Ulid::new());
        self.conn
            .execute(
                "INSERT INTO notifications (id, seq, at, kind, event_id, recipient, correlation_id, source, payload_json) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    intent.id,
                    intent.seq,
                    to_rfc3339(&intent.at),
                    encode_enum(&intent.kind)?,
                    intent.event_id,
                    intent.recipient,
                    intent.correlation_id,
                    encode_enum(&intent.source)?,
                    encode_json(&intent.payload)?,
                ],
            )
            .map_err(sql)?;
        Ok(intent)
    }

    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<NotificationIntent>, TurnoutError> {
        // LIMIT -1 is unbounded in SQLite.
        let limit = limit.map_or(-1, i64::from);
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, seq, at, kind, event_id, recipient, correlation_id, source, payload_json \
                 FROM notifications WHERE seq > ?1 ORDER BY seq ASC LIMIT ?2",
            )
            .map_err(sql)?;
        let mut rows = stmt
            .query(rusqlite::params![after.unwrap_or(0), limit])
            .map_err(sql)?;
        let mut intents = Vec::new();
        while let Some(row) = rows.next().map_err(sql)? {
            intents.push(map_notification_row(row)?);
        }
        Ok(intents)
    }
}

fn next_seq(conn: &Connection) -> Result<i64, TurnoutError> {
    let seq: i64 = conn
        .query_row("SELECT COALESCE(MAX(seq), 0) FROM notifications", [], |row| {
            row.get(0)
        })
        .map_err(sql)?;
    Ok(seq + 1)
}

fn map_notification_row(row: &rusqlite::Row<'_>) -> Result<NotificationIntent, TurnoutError> {
    let at: String = row.get(2).map_err(sql)?;
    let kind: String = row.get(3).map_err(sql)?;
    let source: String = row.get(7).map_err(sql)?;
    let payload_json: String = row.get(8).map_err(sql)?;

    Ok(NotificationIntent {
        id: row.get(0).map_err(sql)?,
        seq: row.get(1).map_err(sql)?,
        at: from_rfc3339(&at)?,
        kind: decode_enum(&kind)?,
        event_id: row.get(4).map_err(sql)?,
        recipient: row.get(5).map_err(sql)?,
        correlation_id: row.get(6).map_err(sql)?,
        source: decode_enum(&source)?,
        payload: decode_json(&payload_json)?,
    })
}
