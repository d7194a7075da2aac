use crate::types::attendee::Attendee;
use crate::types::enums::RsvpStatus;
use crate::types::ids::{EventId, UserId};
use serde::{Deserialize, Serialize};
use turnout_events::NotificationKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationBody {
    RsvpChanged {
        attendee: Attendee,
        from: Option<RsvpStatus>,
        host_id: UserId,
    },
    Promoted {
        attendee: Attendee,
    },
    Waitlisted {
        attendee: Attendee,
    },
    Removed {
        event_id: EventId,
        user_id: UserId,
        removed_by: UserId,
    },
    Invited {
        attendee: Attendee,
        invited_by: UserId,
    },
}

impl NotificationBody {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::RsvpChanged { .. } => NotificationKind::RsvpChanged,
            Self::Promoted { .. } => NotificationKind::Promoted,
            Self::Waitlisted { .. } => NotificationKind::Waitlisted,
            Self::Removed { .. } => NotificationKind::Removed,
            Self::Invited { .. } => NotificationKind::Invited,
        }
    }

    pub fn event_id(&self) -> &EventId {
        match self {
            Self::RsvpChanged { attendee, .. }
            | Self::Promoted { attendee }
            | Self::Waitlisted { attendee }
            | Self::Invited { attendee, .. } => &attendee.event_id,
            Self::Removed { event_id, .. } => event_id,
        }
    }

    /// RSVP changes go to the host; everything else goes to the attendee
    /// it is about.
    pub fn recipient(&self) -> &UserId {
        match self {
            Self::RsvpChanged { host_id, .. } => host_id,
            Self::Promoted { attendee }
            | Self::Waitlisted { attendee }
            | Self::Invited { attendee, .. } => &attendee.user_id,
            Self::Removed { user_id, .. } => user_id,
        }
    }
}
