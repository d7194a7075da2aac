pub mod admission;
pub mod attendees;
pub mod config;
pub mod counters;
pub mod error;
pub mod events;
pub mod locks;
pub mod notifications;
pub mod notify;
pub mod store;
pub mod turnout;
pub mod validation;
pub mod waitlist;

pub mod types;

pub use crate::config::TurnoutConfig;
pub use crate::error::{ErrorKind, TurnoutError};
pub use crate::locks::EventLocks;
pub use crate::store::Store;
pub use crate::turnout::{RequestContext, Turnout};
