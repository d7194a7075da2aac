pub mod dispatcher;
pub mod queue;
pub mod retry;
pub mod types;

pub use crate::dispatcher::{DispatchError, DispatchStats, Dispatcher, LogSink, NotificationSink};
pub use crate::queue::{NotificationQueue, NotificationReceiver, QueueError};
pub use crate::retry::{DispatchConfig, RetryPolicy};
pub use crate::types::{EventSource, NotificationIntent, NotificationKind};
