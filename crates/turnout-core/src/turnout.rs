use crate::admission;
use crate::attendees::AttendeeRepository;
use crate::config::AdmissionConfig;
use crate::counters;
use crate::error::{AttendeeError, EventError, TurnoutError};
use crate::events::EventRepository;
use crate::locks::EventLocks;
use crate::notifications::NotificationRepository;
use crate::notify;
use crate::store::Store;
use crate::types::{
    Attendee, AttendeeFilter, AttendeePage, Caller, CreateEventInput, Event, EventId, EventStatus,
    NotificationBody, PageRequest, ReconcileReport, SubmitRsvpInput, UserId,
};
use crate::validation::{
    ensure_accepting_rsvps, ensure_organizer, validate_page, validate_schedule,
    validate_status_transition,
};
use crate::waitlist;
use chrono::Utc;
use turnout_events::{EventSource, NotificationIntent, NotificationQueue};

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
        }
    }
}

pub struct Turnout<S: Store> {
    store: S,
    queue: NotificationQueue,
    locks: EventLocks,
    config: AdmissionConfig,
}

impl<S: Store> Turnout<S> {
    pub fn new(store: S, queue: NotificationQueue) -> Self {
        Self {
            store,
            queue,
            locks: EventLocks::new(),
            config: AdmissionConfig::default(),
        }
    }

    /// Shares a lock table with other handles writing to the same stores.
    pub fn with_locks(mut self, locks: EventLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_config(mut self, config: AdmissionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    pub fn attendees(&self) -> AttendeesApi<'_, S> {
        AttendeesApi { core: self }
    }

    pub fn waitlist(&self) -> WaitlistApi<'_, S> {
        WaitlistApi { core: self }
    }

    pub fn notifications(&self) -> NotificationsApi<'_, S> {
        NotificationsApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &EventLocks {
        &self.locks
    }

    /// Runs `f` inside the event's critical section and a transaction,
    /// appends the notifications it produced to the outbox, and publishes
    /// them once the transaction has committed and the lock is released.
    fn with_notifications<T, F>(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        f: F,
    ) -> Result<T, TurnoutError>
    where
        F: FnOnce(&S) -> Result<(T, Vec<NotificationBody>), TurnoutError>,
    {
        let guard = self.locks.acquire(event_id, self.config.lock_timeout())?;
        let (value, intents) = self.store.with_tx(|store| {
            let (value, bodies) = f(store)?;
            let mut intents = Vec::with_capacity(bodies.len());
            for body in bodies {
                let intent = notify::build_intent(ctx, body)?;
                intents.push(store.notifications().append(intent)?);
            }
            Ok((value, intents))
        })?;
        drop(guard);
        notify::publish(&self.queue, intents);
        Ok(value)
    }

    fn load_event(&self, event_id: &EventId) -> Result<Event, TurnoutError> {
        self.store
            .events()
            .get(event_id)?
            .ok_or_else(|| EventError::NotFound.into())
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a Turnout<S>,
}

impl<'a, S: Store> EventsApi<'a, S> {
    pub fn create(&self, input: CreateEventInput) -> Result<Event, TurnoutError> {
        if input.title.trim().is_empty() {
            return Err(EventError::InvalidInput {
                message: "title must not be empty".to_string(),
            }
            .into());
        }
        validate_schedule(input.start_time, input.end_time)?;
        let event = self
            .core
            .store
            .with_tx(|store| store.events().create(input))?;
        tracing::info!(
            event_id = %event.id,
            host_id = %event.host_id,
            max = event.max_attendees,
            "event created"
        );
        Ok(event)
    }

    pub fn get(&self, event_id: &EventId) -> Result<Event, TurnoutError> {
        self.core.load_event(event_id)
    }

    /// Changes capacity. Growing it (or lifting the limit with `0`) admits
    /// waitlisted parties from the head; shrinking never displaces anyone.
    pub fn update_capacity(
        &self,
        ctx: &RequestContext,
        caller: &Caller,
        event_id: &EventId,
        max_attendees: u32,
    ) -> Result<Event, TurnoutError> {
        self.core.with_notifications(ctx, event_id, |store| {
            let event = store
                .events()
                .get(event_id)?
                .ok_or(EventError::NotFound)?;
            ensure_organizer(&event, caller, "change capacity")?;
            ensure_accepting_rsvps(&event, Utc::now())?;

            let previous = event.max_attendees;
            let grew = max_attendees == 0 || (previous != 0 && max_attendees > previous);
            let mut event = store.events().set_capacity(event_id, max_attendees)?;
            tracing::info!(
                event_id = %event_id,
                from = previous,
                to = max_attendees,
                "capacity changed"
            );
            let mut bodies = Vec::new();
            if grew {
                bodies.extend(notify::promoted(waitlist::promote(store, &mut event)?));
            }
            Ok((event, bodies))
        })
    }

    pub fn set_status(
        &self,
        ctx: &RequestContext,
        caller: &Caller,
        event_id: &EventId,
        status: EventStatus,
    ) -> Result<Event, TurnoutError> {
        self.core.with_notifications(ctx, event_id, |store| {
            let event = store
                .events()
                .get(event_id)?
                .ok_or(EventError::NotFound)?;
            ensure_organizer(&event, caller, "change event status")?;
            validate_status_transition(event.status, status)?;
            if event.status == status {
                return Ok((event, Vec::new()));
            }
            let updated = store.events().set_status(event_id, status)?;
            tracing::info!(event_id = %event_id, from = %event.status, to = %status, "event status changed");
            Ok((updated, Vec::new()))
        })
    }

    /// Rebuilds the counters from the attendee records and closes any gaps
    /// in the waitlist.
    pub fn reconcile(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
    ) -> Result<ReconcileReport, TurnoutError> {
        self.core.with_notifications(ctx, event_id, |store| {
            let event = store
                .events()
                .get(event_id)?
                .ok_or(EventError::NotFound)?;
            let attendees = store.attendees().all(event_id)?;
            let after = counters::recompute(&attendees);
            if after != event.rsvp_counts {
                store.events().set_counts(event_id, &after)?;
            }
            let positions_repaired = waitlist::reindex(store, event_id)?;
            let report = ReconcileReport {
                event_id: event_id.clone(),
                before: event.rsvp_counts,
                after,
                positions_repaired,
            };
            if report.drifted() {
                tracing::info!(
                    event_id = %event_id,
                    before = ?report.before,
                    after = ?report.after,
                    positions_repaired,
                    "counters reconciled"
                );
            }
            Ok((report, Vec::new()))
        })
    }
}

pub struct AttendeesApi<'a, S: Store> {
    core: &'a Turnout<S>,
}

impl<'a, S: Store> AttendeesApi<'a, S> {
    /// Returns the record as stored, including whether the party ended up
    /// on the waitlist.
    pub fn submit_rsvp(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        user_id: &UserId,
        input: SubmitRsvpInput,
    ) -> Result<Attendee, TurnoutError> {
        self.core.with_notifications(ctx, event_id, |store| {
            admission::submit(store, event_id, user_id, &input, Utc::now())
        })
    }

    pub fn update_guest_count(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        user_id: &UserId,
        guest_count: i64,
    ) -> Result<(), TurnoutError> {
        self.core.with_notifications(ctx, event_id, |store| {
            admission::update_guest_count(store, event_id, user_id, guest_count, Utc::now())
        })
    }

    pub fn remove(
        &self,
        ctx: &RequestContext,
        caller: &Caller,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<(), TurnoutError> {
        self.core.with_notifications(ctx, event_id, |store| {
            admission::remove(store, event_id, user_id, caller, Utc::now())
        })
    }

    pub fn invite(
        &self,
        ctx: &RequestContext,
        caller: &Caller,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Attendee, TurnoutError> {
        self.core.with_notifications(ctx, event_id, |store| {
            admission::invite(store, event_id, user_id, caller, Utc::now())
        })
    }

    pub fn get(&self, event_id: &EventId, user_id: &UserId) -> Result<Attendee, TurnoutError> {
        self.core
            .store
            .attendees()
            .get(event_id, user_id)?
            .ok_or_else(|| AttendeeError::NotFound.into())
    }

    pub fn list(
        &self,
        event_id: &EventId,
        filter: AttendeeFilter,
        page: PageRequest,
    ) -> Result<AttendeePage, TurnoutError> {
        validate_page(&page, self.core.config.max_page_size)?;
        self.core.load_event(event_id)?;
        let attendees = self.core.store.attendees();
        Ok(AttendeePage {
            items: attendees.list(event_id, &filter, &page)?,
            total: attendees.count(event_id, &filter)?,
            page: page.page,
            limit: page.limit,
        })
    }
}

pub struct WaitlistApi<'a, S: Store> {
    core: &'a Turnout<S>,
}

impl<'a, S: Store> WaitlistApi<'a, S> {
    /// Waitlisted records in queue order.
    pub fn list(&self, event_id: &EventId, page: PageRequest) -> Result<AttendeePage, TurnoutError> {
        validate_page(&page, self.core.config.max_page_size)?;
        self.core.load_event(event_id)?;
        let attendees = self.core.store.attendees();
        Ok(AttendeePage {
            items: attendees.waitlist_page(event_id, &page)?,
            total: u64::from(attendees.waitlist_len(event_id)?),
            page: page.page,
            limit: page.limit,
        })
    }
}

pub struct NotificationsApi<'a, S: Store> {
    core: &'a Turnout<S>,
}

impl<'a, S: Store> NotificationsApi<'a, S> {
    /// Outbox records with a sequence number greater than `after`.
    pub fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<NotificationIntent>, TurnoutError> {
        if limit == Some(0) {
            return Err(EventError::InvalidInput {
                message: "limit must be positive".to_string(),
            }
            .into());
        }
        self.core.store.notifications().list(after, limit)
    }
}
