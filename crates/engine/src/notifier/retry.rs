use async_trait::async_trait;
use std::time::Duration;

use super::channel::{ChannelDeliveryError, Notifier};
use crate::alert::{AlertEvent, ChannelKind};

/// Retries a channel in-call with exponential backoff. Nothing is queued
/// once the attempts are spent.
pub struct RetryNotifier<N: Notifier> {
    inner: N,
    max_retries: u32,
    base_delay: Duration,
}

impl<N: Notifier> RetryNotifier<N> {
    pub fn new(inner: N, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }
}

#[async_trait]
impl<N: Notifier> Notifier for RetryNotifier<N> {
    fn kind(&self) -> ChannelKind {
        self.inner.kind()
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelDeliveryError> {
        let mut attempt = 0;
        loop {
            match self.inner.send(event).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        channel = %self.inner.kind(),
                        attempt = attempt + 1,
                        error = %e,
                        "channel send failed, retrying"
                    );
                    tokio::time::sleep(self.base_delay.saturating_mul(2u32.saturating_pow(attempt))).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{EventStatus, Severity};
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailingNotifier {
        fail_count: AtomicU32,
        max_failures: u32,
    }

    impl FailingNotifier {
        fn new(max_failures: u32) -> Self {
            Self {
                fail_count: AtomicU32::new(0),
                max_failures,
            }
        }
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        fn kind(&self) -> ChannelKind {
            ChannelKind::Discord
        }

        async fn send(&self, _event: &AlertEvent) -> Result<(), ChannelDeliveryError> {
            let count = self.fail_count.fetch_add(1, Ordering::SeqCst);
            if count < self.max_failures {
                Err(ChannelDeliveryError::Transport(format!("fail #{}", count + 1)))
            } else {
                Ok(())
            }
        }
    }

    fn sample_event() -> AlertEvent {
        AlertEvent {
            id: "evt-1".into(),
            rule_name: "cpu_high".into(),
            metric: "cpu_usage".into(),
            current_value: 90.0,
            threshold_value: 80.0,
            severity: Severity::Medium,
            status: EventStatus::Triggered,
            message: "test".into(),
            occurred_at: Utc::now(),
            manual: false,
            deliveries: Vec::new(),
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let retry = RetryNotifier::new(FailingNotifier::new(0), 3, Duration::from_millis(1));
        assert!(retry.send(&sample_event()).await.is_ok());
        assert_eq!(retry.inner.fail_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let retry = RetryNotifier::new(FailingNotifier::new(2), 3, Duration::from_millis(1));
        assert!(retry.send(&sample_event()).await.is_ok());
        assert_eq!(retry.inner.fail_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fails_after_max_retries() {
        let retry = RetryNotifier::new(FailingNotifier::new(10), 2, Duration::from_millis(1));
        let err = retry.send(&sample_event()).await.unwrap_err();
        assert_eq!(err, ChannelDeliveryError::Transport("fail #3".into()));
        assert_eq!(retry.kind(), ChannelKind::Discord);
    }

    #[tokio::test]
    async fn many_retries_without_delay_do_not_overflow() {
        let retry = RetryNotifier::new(FailingNotifier::new(u32::MAX), 40, Duration::ZERO);
        assert!(retry.send(&sample_event()).await.is_err());
        assert_eq!(retry.inner.fail_count.load(Ordering::SeqCst), 41);
    }
}
