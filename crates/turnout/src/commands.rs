use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use turnout_core::types::{Caller, EventId, EventStatus, PageRequest, RsvpStatus, UserId};

#[derive(Parser)]
#[command(name = "turnout", version, about = "Event admission and waitlist management")]
pub struct Cli {
    /// Config file (defaults to $TURNOUT_CONFIG, then ./turnout.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database path, overriding the config file
    #[arg(long, global = true)]
    pub db: Option<String>,
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database and apply migrations
    Init,
    #[command(subcommand)]
    Event(EventCommand),
    /// Submit or change an RSVP
    Rsvp(RsvpArgs),
    /// Change the number of guests on an admitted RSVP
    Guests(GuestsArgs),
    Invite(TargetArgs),
    Remove(TargetArgs),
    /// List attendees in RSVP order
    Attendees(AttendeesArgs),
    /// List the waitlist in queue order
    Waitlist(WaitlistArgs),
    /// Show the notification outbox
    Outbox(OutboxArgs),
    #[command(
        about = "Replay outbox records through the dispatcher",
        long_about = r#"
Re-queue notification outbox records and deliver them through the
configured sink, with the usual timeout and retry policy.

Examples:
  turnout dispatch              # everything in the outbox
  turnout dispatch --after 120  # records with seq > 120
"#
    )]
    Dispatch(OutboxArgs),
}

#[derive(Subcommand)]
pub enum EventCommand {
    Create(CreateEventArgs),
    Show { event_id: EventId },
    /// Change capacity (0 = unlimited); growth promotes from the waitlist
    Capacity {
        event_id: EventId,
        max_attendees: u32,
        #[command(flatten)]
        caller: CallerArgs,
    },
    Status {
        event_id: EventId,
        status: EventStatus,
        #[command(flatten)]
        caller: CallerArgs,
    },
    /// Recompute counters from attendee records and repair queue positions
    Reconcile { event_id: EventId },
}

#[derive(Args)]
pub struct CreateEventArgs {
    #[arg(long)]
    pub host: UserId,
    #[arg(long = "co-host")]
    pub co_hosts: Vec<UserId>,
    #[arg(long)]
    pub title: String,
    /// Capacity in people; 0 means unlimited
    #[arg(long, default_value = "0")]
    pub max: u32,
    /// RFC 3339 start time
    #[arg(long)]
    pub start: DateTime<Utc>,
    /// RFC 3339 end time
    #[arg(long)]
    pub end: DateTime<Utc>,
}

#[derive(Args)]
pub struct CallerArgs {
    /// Acting user
    #[arg(long = "as")]
    pub user: UserId,
    #[arg(long)]
    pub admin: bool,
}

impl CallerArgs {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.user.clone(),
            admin: self.admin,
        }
    }
}

#[derive(Args)]
pub struct RsvpArgs {
    pub event_id: EventId,
    pub user_id: UserId,
    pub rsvp: RsvpStatus,
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub guests: i64,
}

#[derive(Args)]
pub struct GuestsArgs {
    pub event_id: EventId,
    pub user_id: UserId,
    #[arg(allow_negative_numbers = true)]
    pub guest_count: i64,
}

#[derive(Args)]
pub struct TargetArgs {
    pub event_id: EventId,
    pub user_id: UserId,
    #[command(flatten)]
    pub caller: CallerArgs,
}

#[derive(Args)]
pub struct PageArgs {
    #[arg(long, default_value = "1")]
    pub page: u32,
    #[arg(long, default_value = "50")]
    pub limit: u32,
}

impl PageArgs {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Args)]
pub struct AttendeesArgs {
    pub event_id: EventId,
    #[arg(long)]
    pub rsvp: Option<RsvpStatus>,
    #[arg(long)]
    pub waitlisted: Option<bool>,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args)]
pub struct WaitlistArgs {
    pub event_id: EventId,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args)]
pub struct OutboxArgs {
    #[arg(long)]
    pub after: Option<i64>,
    #[arg(long)]
    pub limit: Option<u32>,
}
