use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use turnout_core::types::{Attendee, AttendeePage, Event, ReconcileReport, RsvpCounts};
use turnout_events::NotificationIntent;

pub enum Output {
    Event(Event),
    Attendee(Attendee),
    Page(AttendeePage),
    Report(ReconcileReport),
    Notifications(Vec<NotificationIntent>),
    Message(String),
}

impl Output {
    pub fn print(&self, json: bool) -> Result<(), serde_json::Error> {
        if json {
            return match self {
                Self::Event(event) => print_json(event),
                Self::Attendee(attendee) => print_json(attendee),
                Self::Page(page) => print_json(page),
                Self::Report(report) => print_json(report),
                Self::Notifications(intents) => print_json(intents),
                Self::Message(message) => print_json(&serde_json::json!({ "message": message })),
            };
        }
        match self {
            Self::Event(event) => print_event(event),
            Self::Attendee(attendee) => println!("{}", attendee_line(attendee)),
            Self::Page(page) => {
                for attendee in &page.items {
                    println!("{}", attendee_line(attendee));
                }
                println!(
                    "{}",
                    format!("page {} ({} per page), {} total", page.page, page.limit, page.total)
                        .if_supports_color(Stream::Stdout, |text| text.dimmed())
                );
            }
            Self::Report(report) => {
                let verdict = if report.drifted() { "repaired" } else { "clean" };
                println!("{} {}", report.event_id, verdict.if_supports_color(Stream::Stdout, |text| text.bold()));
                println!("  before  {}", counts_line(&report.before));
                println!("  after   {}", counts_line(&report.after));
                println!("  positions repaired: {}", report.positions_repaired);
            }
            Self::Notifications(intents) => {
                for intent in intents {
                    println!(
                        "{:>6}  {:<13} {} -> {}",
                        intent.seq,
                        intent.kind.as_str().if_supports_color(Stream::Stdout, |text| text.cyan()),
                        intent.event_id,
                        intent.recipient
                    );
                }
            }
            Self::Message(message) => {
                println!("{}", message.if_supports_color(Stream::Stdout, |text| text.green()));
            }
        }
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_event(event: &Event) {
    let capacity = if event.is_unlimited() {
        "unlimited".to_string()
    } else {
        event.max_attendees.to_string()
    };
    println!(
        "{} {}",
        event.title.if_supports_color(Stream::Stdout, |text| text.bold()),
        format!("[{}]", event.status).if_supports_color(Stream::Stdout, |text| text.yellow())
    );
    println!("  id        {}", event.id);
    println!("  host      {}", event.host_id);
    println!("  when      {} .. {}", event.start_time, event.end_time);
    println!("  capacity  {capacity}");
    println!("  counts    {}", counts_line(&event.rsvp_counts));
}

fn counts_line(counts: &RsvpCounts) -> String {
    format!(
        "going={} interested={} not_going={} no_reply={} waitlist={}",
        counts.going, counts.interested, counts.not_going, counts.no_reply, counts.waitlist
    )
}

fn attendee_line(attendee: &Attendee) -> String {
    let state = if attendee.is_waitlisted {
        format!("waitlisted #{}", attendee.waitlist_position)
            .if_supports_color(Stream::Stdout, |text| text.yellow())
            .to_string()
    } else {
        attendee
            .rsvp
            .as_str()
            .if_supports_color(Stream::Stdout, |text| text.green())
            .to_string()
    };
    format!(
        "{}  {}  +{} guests  {}",
        attendee.user_id,
        state,
        attendee.guest_count,
        attendee.rsvp_timestamp.format("%Y-%m-%d %H:%M:%S")
    )
}
