use crate::types::NotificationIntent;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("notification queue full, dropped {id}")]
    Full { id: String },
    #[error("notification queue closed, dropped {id}")]
    Closed { id: String },
}

/// Outbound side of the notification pipeline.
///
/// Publishing never blocks: the admission path calls it after commit and
/// must not wait on delivery.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<NotificationIntent>,
}

pub type NotificationReceiver = mpsc::Receiver<NotificationIntent>;

impl NotificationQueue {
    pub fn new(capacity: usize) -> (Self, NotificationReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub fn publish(&self, intent: NotificationIntent) -> Result<(), QueueError> {
        self.sender.try_send(intent).map_err(|err| match err {
            TrySendError::Full(intent) => QueueError::Full { id: intent.id },
            TrySendError::Closed(intent) => QueueError::Closed { id: intent.id },
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventSource, NotificationKind};
    use chrono::Utc;

    fn intent(id: &str) -> NotificationIntent {
        NotificationIntent {
            id: id.to_string(),
            seq: 1,
            at: Utc::now(),
            kind: NotificationKind::Promoted,
            event_id: "evt_1".to_string(),
            recipient: "usr_1".to_string(),
            correlation_id: None,
            source: EventSource::Api,
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn full_queue_reports_dropped_intent() {
        let (queue, mut receiver) = NotificationQueue::new(1);
        queue.publish(intent("ntf_a")).unwrap();
        let err = queue.publish(intent("ntf_b")).unwrap_err();
        assert_eq!(
            err,
            QueueError::Full {
                id: "ntf_b".to_string()
            }
        );
        assert_eq!(receiver.try_recv().unwrap().id, "ntf_a");
    }

    #[test]
    fn closed_queue_reports_dropped_intent() {
        let (queue, receiver) = NotificationQueue::new(4);
        drop(receiver);
        assert!(queue.is_closed());
        assert!(matches!(
            queue.publish(intent("ntf_c")),
            Err(QueueError::Closed { .. })
        ));
    }
}
