#![allow(dead_code)]

use chrono::{Duration, Utc};
use turnout_core::attendees::AttendeeRepository;
use turnout_core::counters;
use turnout_core::store::Store;
use turnout_core::types::{
    Attendee, Caller, CreateEventInput, Event, EventId, RsvpStatus, SubmitRsvpInput, UserId,
};
use turnout_core::{RequestContext, Turnout, TurnoutError};
use turnout_db::DbStore;
use turnout_events::{EventSource, NotificationKind, NotificationQueue, NotificationReceiver};

pub struct Harness {
    pub turnout: Turnout<DbStore>,
    pub receiver: NotificationReceiver,
    pub ctx: RequestContext,
    pub host: UserId,
}

pub fn harness() -> Harness {
    let (queue, receiver) = NotificationQueue::new(256);
    Harness {
        turnout: Turnout::new(DbStore::in_memory().unwrap(), queue),
        receiver,
        ctx: RequestContext::new(EventSource::Api, None),
        host: UserId::generate(),
    }
}

pub fn event_input(host: &UserId, max_attendees: u32) -> CreateEventInput {
    let start = Utc::now() + Duration::days(7);
    CreateEventInput {
        host_id: host.clone(),
        co_hosts: Vec::new(),
        title: "Community picnic".to_string(),
        max_attendees,
        start_time: start,
        end_time: start + Duration::hours(4),
    }
}

impl Harness {
    pub fn event(&self, max_attendees: u32) -> Event {
        self.turnout
            .events()
            .create(event_input(&self.host, max_attendees))
            .unwrap()
    }

    pub fn host_caller(&self) -> Caller {
        Caller::user(self.host.clone())
    }

    pub fn rsvp(
        &self,
        event_id: &EventId,
        user_id: &UserId,
        rsvp: RsvpStatus,
        guest_count: i64,
    ) -> Result<Attendee, TurnoutError> {
        self.turnout.attendees().submit_rsvp(
            &self.ctx,
            event_id,
            user_id,
            SubmitRsvpInput::new(rsvp, guest_count),
        )
    }

    pub fn going(&self, event_id: &EventId, guest_count: i64) -> (UserId, Attendee) {
        let user_id = UserId::generate();
        let attendee = self
            .rsvp(event_id, &user_id, RsvpStatus::Going, guest_count)
            .unwrap();
        (user_id, attendee)
    }

    pub fn remove_self(&self, event_id: &EventId, user_id: &UserId) {
        self.turnout
            .attendees()
            .remove(&self.ctx, &Caller::user(user_id.clone()), event_id, user_id)
            .unwrap();
    }

    pub fn attendee(&self, event_id: &EventId, user_id: &UserId) -> Attendee {
        self.turnout.attendees().get(event_id, user_id).unwrap()
    }

    pub fn waitlist_users(&self, event_id: &EventId) -> Vec<UserId> {
        self.turnout
            .store()
            .attendees()
            .waitlist(event_id)
            .unwrap()
            .into_iter()
            .map(|attendee| attendee.user_id)
            .collect()
    }

    pub fn published(&mut self) -> Vec<NotificationKind> {
        let mut kinds = Vec::new();
        while let Ok(intent) = self.receiver.try_recv() {
            kinds.push(intent.kind);
        }
        kinds
    }
}

/// Checks the aggregate counters, the capacity bound and the waitlist
/// numbering against the stored attendee records.
pub fn assert_consistent<S: Store>(turnout: &Turnout<S>, event_id: &EventId) {
    let event = turnout.events().get(event_id).unwrap();
    let attendees = turnout.store().attendees().all(event_id).unwrap();
    assert_eq!(event.rsvp_counts, counters::recompute(&attendees));

    let admitted: u32 = attendees.iter().map(Attendee::admitted_weight).sum();
    if !event.is_unlimited() {
        assert!(
            admitted <= event.max_attendees,
            "admitted {admitted} exceeds capacity {}",
            event.max_attendees
        );
    }

    let positions: Vec<u32> = turnout
        .store()
        .attendees()
        .waitlist(event_id)
        .unwrap()
        .iter()
        .map(|attendee| attendee.waitlist_position)
        .collect();
    let expected: Vec<u32> = (1..=u32::try_from(positions.len()).unwrap()).collect();
    assert_eq!(positions, expected);

    for attendee in &attendees {
        if attendee.is_waitlisted {
            assert_eq!(attendee.rsvp, RsvpStatus::Going);
        } else {
            assert_eq!(attendee.waitlist_position, 0);
        }
    }
}
