use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A notification the admission core has decided must go out.
///
/// Intents are written to the outbox in the same transaction as the state
/// change that produced them and are delivered afterwards, so `seq` and `id`
/// are only meaningful once the outbox has assigned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub id: String,
    pub seq: i64,
    pub at: DateTime<Utc>,
    pub kind: NotificationKind,
    pub event_id: String,
    pub recipient: String,
    pub correlation_id: Option<String>,
    pub source: EventSource,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RsvpChanged,
    Promoted,
    Waitlisted,
    Removed,
    Invited,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RsvpChanged => "rsvp_changed",
            Self::Promoted => "promoted",
            Self::Waitlisted => "waitlisted",
            Self::Removed => "removed",
            Self::Invited => "invited",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventSource {
    Api,
    Cli,
    Scheduler,
}
