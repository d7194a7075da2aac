//! Decides which notifications a transition produces and turns them into
//! outbox intents. Delivery happens elsewhere.

use crate::admission::Admission;
use crate::error::TurnoutError;
use crate::turnout::RequestContext;
use crate::types::{Attendee, Event, NotificationBody, UserId};
use chrono::Utc;
use turnout_events::{NotificationIntent, NotificationQueue};

/// Notifications for an RSVP submission: `rsvp_changed` to the host when
/// the status value changed, plus `waitlisted` or `promoted` to the
/// attendee when their queue state changed.
pub fn for_rsvp(
    event: &Event,
    prior: Option<&Attendee>,
    updated: &Attendee,
    admission: Admission,
) -> Vec<NotificationBody> {
    let mut bodies = Vec::new();
    let from = prior.map(|attendee| attendee.rsvp);
    if from != Some(updated.rsvp) {
        bodies.push(NotificationBody::RsvpChanged {
            attendee: updated.clone(),
            from,
            host_id: event.host_id.clone(),
        });
    }
    match admission {
        Admission::Waitlist => bodies.push(NotificationBody::Waitlisted {
            attendee: updated.clone(),
        }),
        Admission::Promote => bodies.push(NotificationBody::Promoted {
            attendee: updated.clone(),
        }),
        Admission::Admit | Admission::StayWaitlisted => {}
    }
    bodies
}

pub fn promoted(attendees: Vec<Attendee>) -> impl Iterator<Item = NotificationBody> {
    attendees
        .into_iter()
        .map(|attendee| NotificationBody::Promoted { attendee })
}

pub fn removed(prior: &Attendee, removed_by: &UserId) -> NotificationBody {
    NotificationBody::Removed {
        event_id: prior.event_id.clone(),
        user_id: prior.user_id.clone(),
        removed_by: removed_by.clone(),
    }
}

pub fn build_intent(
    ctx: &RequestContext,
    body: NotificationBody,
) -> Result<NotificationIntent, TurnoutError> {
    let kind = body.kind();
    let event_id = body.event_id().to_string();
    let recipient = body.recipient().to_string();
    let payload = serde_json::to_value(body).map_err(|err| TurnoutError::Internal {
        message: err.to_string(),
    })?;
    Ok(NotificationIntent {
        id: String::new(),
        seq: 0,
        at: Utc::now(),
        kind,
        event_id,
        recipient,
        correlation_id: ctx.correlation_id.clone(),
        source: ctx.source,
        payload,
    })
}

/// Hands committed intents to the dispatcher queue. Failures are logged and
/// otherwise ignored: the state change is already durable and the outbox
/// still holds the intent.
pub fn publish(queue: &NotificationQueue, intents: Vec<NotificationIntent>) {
    for intent in intents {
        let kind = intent.kind;
        let seq = intent.seq;
        if let Err(err) = queue.publish(intent) {
            tracing::warn!(kind = %kind, seq, error = %err, "notification not queued");
        }
    }
}
