mod commands;
mod output;

use clap::Parser;
use commands::{Cli, Command, EventCommand};
use output::Output;
use owo_colors::{OwoColorize, Stream};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use turnout_core::config::{ConfigError, DEFAULT_CONFIG_PATH};
use turnout_core::types::{AttendeeFilter, CreateEventInput, SubmitRsvpInput};
use turnout_core::{RequestContext, Turnout, TurnoutConfig, TurnoutError};
use turnout_db::DbStore;
use turnout_events::{Dispatcher, EventSource, LogSink, NotificationQueue};

enum CliError {
    Config(ConfigError),
    Core(TurnoutError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl CliError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Core(err) => err.kind().as_str(),
            Self::Io(_) => "io",
            Self::Json(_) => "output",
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Core(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
        }
    }
}

impl From<TurnoutError> for CliError {
    fn from(value: TurnoutError) -> Self {
        Self::Core(value)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{} [{}] {err}",
                "error:".if_supports_color(Stream::Stderr, |text| text.red()),
                err.kind()
            );
            ExitCode::FAILURE
        }
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .or_else(|| std::env::var_os("TURNOUT_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = TurnoutConfig::load(&config_path(&cli)).map_err(CliError::Config)?;
    if let Some(db) = cli.db.clone() {
        config.database.path = db;
    }
    init_tracing(&config.log_level);

    if let Some(parent) = Path::new(&config.database.path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).map_err(CliError::Io)?;
    }
    let store = DbStore::open(&config.database.path, config.database.busy_timeout())?;

    let (queue, receiver) = NotificationQueue::new(config.dispatch.queue_capacity);
    let dispatcher = Dispatcher::new(Arc::new(LogSink), &config.dispatch).spawn(receiver);
    let turnout = Turnout::new(store, queue.clone()).with_config(config.admission.clone());
    let ctx = RequestContext::new(EventSource::Cli, None);

    let result = execute(&turnout, &queue, &ctx, cli.command);
    drop(turnout);
    drop(queue);
    match dispatcher.await {
        Ok(stats) if stats.dropped > 0 => {
            tracing::warn!(dropped = stats.dropped, "some notifications were not delivered");
        }
        Ok(_) => {}
        Err(err) => tracing::error!(error = %err, "dispatcher task failed"),
    }

    result?.print(cli.json).map_err(CliError::Json)
}

fn execute(
    turnout: &Turnout<DbStore>,
    queue: &NotificationQueue,
    ctx: &RequestContext,
    command: Command,
) -> Result<Output, CliError> {
    let output = match command {
        Command::Init => Output::Message("database ready".to_string()),
        Command::Event(command) => match command {
            EventCommand::Create(args) => Output::Event(turnout.events().create(CreateEventInput {
                host_id: args.host,
                co_hosts: args.co_hosts,
                title: args.title,
                max_attendees: args.max,
                start_time: args.start,
                end_time: args.end,
            })?),
            EventCommand::Show { event_id } => Output::Event(turnout.events().get(&event_id)?),
            EventCommand::Capacity {
                event_id,
                max_attendees,
                caller,
            } => Output::Event(turnout.events().update_capacity(
                ctx,
                &caller.caller(),
                &event_id,
                max_attendees,
            )?),
            EventCommand::Status {
                event_id,
                status,
                caller,
            } => Output::Event(
                turnout
                    .events()
                    .set_status(ctx, &caller.caller(), &event_id, status)?,
            ),
            EventCommand::Reconcile { event_id } => {
                Output::Report(turnout.events().reconcile(ctx, &event_id)?)
            }
        },
        Command::Rsvp(args) => Output::Attendee(turnout.attendees().submit_rsvp(
            ctx,
            &args.event_id,
            &args.user_id,
            SubmitRsvpInput::new(args.rsvp, args.guests),
        )?),
        Command::Guests(args) => {
            turnout.attendees().update_guest_count(
                ctx,
                &args.event_id,
                &args.user_id,
                args.guest_count,
            )?;
            Output::Attendee(turnout.attendees().get(&args.event_id, &args.user_id)?)
        }
        Command::Invite(args) => Output::Attendee(turnout.attendees().invite(
            ctx,
            &args.caller.caller(),
            &args.event_id,
            &args.user_id,
        )?),
        Command::Remove(args) => {
            turnout.attendees().remove(
                ctx,
                &args.caller.caller(),
                &args.event_id,
                &args.user_id,
            )?;
            Output::Message(format!("removed {} from {}", args.user_id, args.event_id))
        }
        Command::Attendees(args) => Output::Page(turnout.attendees().list(
            &args.event_id,
            AttendeeFilter {
                rsvp: args.rsvp,
                waitlisted: args.waitlisted,
            },
            args.page.request(),
        )?),
        Command::Waitlist(args) => Output::Page(
            turnout
                .waitlist()
                .list(&args.event_id, args.page.request())?,
        ),
        Command::Outbox(args) => {
            Output::Notifications(turnout.notifications().list(args.after, args.limit)?)
        }
        Command::Dispatch(args) => {
            let intents = turnout.notifications().list(args.after, args.limit)?;
            let mut queued = 0;
            for intent in intents {
                if let Err(err) = queue.publish(intent) {
                    tracing::warn!(error = %err, queued, "replay stopped");
                    break;
                }
                queued += 1;
            }
            Output::Message(format!("queued {queued} notifications for delivery"))
        }
    };
    Ok(output)
}
