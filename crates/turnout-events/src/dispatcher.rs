use crate::queue::NotificationReceiver;
use crate::retry::{DispatchConfig, RetryPolicy};
use crate::types::{NotificationIntent, NotificationKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("delivery rejected: {message}")]
    Rejected { message: String },
    #[error("delivery channel unavailable: {message}")]
    Unavailable { message: String },
    #[error("delivery timed out after {ms}ms")]
    Timeout { ms: u128 },
}

impl DispatchError {
    /// A rejection is final; the channel may recover from anything else.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// The external delivery collaborator (push, email, SMS, ...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn dispatch(
        &self,
        kind: NotificationKind,
        payload: &NotificationIntent,
    ) -> Result<(), DispatchError>;
}

/// Sink that only writes intents to the log. Used by the CLI when no
/// delivery channel is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn dispatch(
        &self,
        kind: NotificationKind,
        payload: &NotificationIntent,
    ) -> Result<(), DispatchError> {
        tracing::info!(
            kind = %kind,
            seq = payload.seq,
            event_id = %payload.event_id,
            recipient = %payload.recipient,
            "notification"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub dropped: u64,
    pub retries: u64,
}

/// Drains the notification queue and hands each intent to the sink.
///
/// Every attempt is bounded by the configured timeout; failures are retried
/// with exponential backoff and dropped once retries run out. Nothing here
/// feeds back into admission state.
pub struct Dispatcher<K: NotificationSink> {
    sink: Arc<K>,
    timeout: Duration,
    policy: RetryPolicy,
}

impl<K: NotificationSink + 'static> Dispatcher<K> {
    pub fn new(sink: Arc<K>, config: &DispatchConfig) -> Self {
        Self {
            sink,
            timeout: config.timeout(),
            policy: config.retry_policy(),
        }
    }

    pub fn spawn(self, receiver: NotificationReceiver) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run(receiver))
    }

    /// Runs until every queue handle has been dropped and the queue is empty.
    pub async fn run(self, mut receiver: NotificationReceiver) -> DispatchStats {
        tracing::debug!("notification dispatcher started");
        let mut stats = DispatchStats::default();
        while let Some(intent) = receiver.recv().await {
            let (attempts, outcome) = self.attempt(&intent).await;
            stats.retries += u64::from(attempts.saturating_sub(1));
            match outcome {
                Ok(()) => stats.delivered += 1,
                Err(err) => {
                    stats.dropped += 1;
                    tracing::error!(
                        kind = %intent.kind,
                        seq = intent.seq,
                        event_id = %intent.event_id,
                        attempts,
                        error = %err,
                        "notification dropped"
                    );
                }
            }
        }
        tracing::info!(
            delivered = stats.delivered,
            dropped = stats.dropped,
            "notification dispatcher stopped"
        );
        stats
    }

    /// Delivers one intent, returning the number of attempts it took.
    pub async fn deliver(&self, intent: &NotificationIntent) -> Result<u32, DispatchError> {
        let (attempts, outcome) = self.attempt(intent).await;
        outcome.map(|()| attempts)
    }

    async fn attempt(&self, intent: &NotificationIntent) -> (u32, Result<(), DispatchError>) {
        let mut attempt: u32 = 0;
        loop {
            let outcome =
                match tokio::time::timeout(self.timeout, self.sink.dispatch(intent.kind, intent))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(DispatchError::Timeout {
                        ms: self.timeout.as_millis(),
                    }),
                };
            match outcome {
                Ok(()) => return (attempt + 1, Ok(())),
                Err(err) if !err.is_retryable() || attempt >= self.policy.max_retries => {
                    return (attempt + 1, Err(err));
                }
                Err(err) => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    tracing::warn!(
                        kind = %intent.kind,
                        seq = intent.seq,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "notification delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::NotificationQueue;
    use crate::types::EventSource;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn intent(seq: i64, kind: NotificationKind) -> NotificationIntent {
        NotificationIntent {
            id: format!("ntf_{seq}"),
            seq,
            at: Utc::now(),
            kind,
            event_id: "evt_test".to_string(),
            recipient: "usr_test".to_string(),
            correlation_id: None,
            source: EventSource::Api,
            payload: serde_json::json!({}),
        }
    }

    fn config(max_retries: u32) -> DispatchConfig {
        DispatchConfig {
            queue_capacity: 16,
            timeout_ms: 1000,
            max_retries,
            initial_backoff_ms: 10,
            max_backoff_ms: 100,
            multiplier: 2.0,
        }
    }

    #[derive(Default)]
    struct FlakySink {
        failures_left: AtomicU32,
        delivered: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn dispatch(
            &self,
            _kind: NotificationKind,
            payload: &NotificationIntent,
        ) -> Result<(), DispatchError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(DispatchError::Unavailable {
                    message: "smtp down".to_string(),
                });
            }
            self.delivered.lock().unwrap().push(payload.seq);
            Ok(())
        }
    }

    struct StalledSink;

    #[async_trait]
    impl NotificationSink for StalledSink {
        async fn dispatch(
            &self,
            _kind: NotificationKind,
            _payload: &NotificationIntent,
        ) -> Result<(), DispatchError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures() {
        let sink = Arc::new(FlakySink {
            failures_left: AtomicU32::new(2),
            ..FlakySink::default()
        });
        let dispatcher = Dispatcher::new(sink.clone(), &config(3));
        let attempts = dispatcher
            .deliver(&intent(7, NotificationKind::Promoted))
            .await
            .unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(*sink.delivered.lock().unwrap(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let sink = Arc::new(FlakySink {
            failures_left: AtomicU32::new(10),
            ..FlakySink::default()
        });
        let dispatcher = Dispatcher::new(sink.clone(), &config(2));
        let err = dispatcher
            .deliver(&intent(1, NotificationKind::Removed))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unavailable { .. }));
        assert_eq!(sink.failures_left.load(Ordering::SeqCst), 7);
    }

    #[derive(Default)]
    struct RejectingSink {
        calls: AtomicU32,
    }

    #[async_trait]
    impl NotificationSink for RejectingSink {
        async fn dispatch(
            &self,
            _kind: NotificationKind,
            _payload: &NotificationIntent,
        ) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DispatchError::Rejected {
                message: "unknown recipient".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_is_not_retried() {
        let sink = Arc::new(RejectingSink::default());
        let dispatcher = Dispatcher::new(sink.clone(), &config(3));
        let err = dispatcher
            .deliver(&intent(4, NotificationKind::Invited))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Rejected { .. }));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_intents_count_no_retries() {
        let sink = Arc::new(RejectingSink::default());
        let (queue, receiver) = NotificationQueue::new(8);
        let handle = Dispatcher::new(sink.clone(), &config(3)).spawn(receiver);
        queue
            .publish(intent(1, NotificationKind::Waitlisted))
            .unwrap();
        drop(queue);
        let stats = handle.await.unwrap();
        assert_eq!(
            stats,
            DispatchStats {
                delivered: 0,
                dropped: 1,
                retries: 0
            }
        );
    }

    #[test]
    fn only_rejection_is_permanent() {
        let rejected = DispatchError::Rejected {
            message: "bad address".to_string(),
        };
        let unavailable = DispatchError::Unavailable {
            message: "down".to_string(),
        };
        assert!(!rejected.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(DispatchError::Timeout { ms: 10 }.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_sink_times_out() {
        let dispatcher = Dispatcher::new(Arc::new(StalledSink), &config(0));
        let err = dispatcher
            .deliver(&intent(1, NotificationKind::Waitlisted))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { ms: 1000 }));
    }

    #[tokio::test(start_paused = true)]
    async fn run_drains_queue_in_order_until_closed() {
        let sink = Arc::new(FlakySink {
            failures_left: AtomicU32::new(1),
            ..FlakySink::default()
        });
        let (queue, receiver) = NotificationQueue::new(8);
        let handle = Dispatcher::new(sink.clone(), &config(1)).spawn(receiver);
        for seq in 1..=3 {
            queue
                .publish(intent(seq, NotificationKind::RsvpChanged))
                .unwrap();
        }
        drop(queue);
        let stats = handle.await.unwrap();
        assert_eq!(
            stats,
            DispatchStats {
                delivered: 3,
                dropped: 0,
                retries: 1
            }
        );
        assert_eq!(*sink.delivered.lock().unwrap(), vec![1, 2, 3]);
    }
}
