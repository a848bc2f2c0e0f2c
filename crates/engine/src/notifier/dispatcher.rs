use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::channel::{ChannelDeliveryError, Notifier};
use crate::alert::{AlertEvent, AlertRule, ChannelKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub channel: ChannelKind,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl DispatchResult {
    fn from_outcome(channel: ChannelKind, outcome: Result<(), ChannelDeliveryError>) -> Self {
        Self {
            channel,
            success: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered,
    Partial,
    Failed,
    NoChannels,
}

impl DispatchOutcome {
    pub fn of(results: &[DispatchResult]) -> Self {
        let ok = results.iter().filter(|r| r.success).count();
        match (ok, results.len()) {
            (_, 0) => Self::NoChannels,
            (ok, total) if ok == total => Self::Delivered,
            (0, _) => Self::Failed,
            _ => Self::Partial,
        }
    }
}

/// Fans an event out to the rule's channels. Channel failures are folded
/// into the results, never returned as errors.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifiers: BTreeMap<ChannelKind, Arc<dyn Notifier>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            notifiers: BTreeMap::new(),
            timeout,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.insert(notifier.kind(), notifier);
        self
    }

    pub fn channels(&self) -> Vec<ChannelKind> {
        self.notifiers.keys().copied().collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One result per channel of the rule, in channel order.
    pub async fn dispatch(&self, rule: &AlertRule, event: &AlertEvent) -> Vec<DispatchResult> {
        let sends = rule.channels.iter().map(|&kind| async move {
            let outcome = match self.notifiers.get(&kind) {
                None => Err(ChannelDeliveryError::NotConfigured(kind)),
                Some(notifier) => match tokio::time::timeout(self.timeout, notifier.send(event)).await {
                    Ok(res) => res,
                    Err(_) => Err(ChannelDeliveryError::Timeout(self.timeout)),
                },
            };
            if let Err(ref e) = outcome {
                tracing::warn!(rule = %rule.name, channel = %kind, error = %e, "channel delivery failed");
            }
            DispatchResult::from_outcome(kind, outcome)
        });

        let results = join_all(sends).await;
        tracing::info!(
            rule = %rule.name,
            status = event.status.as_str(),
            outcome = ?DispatchOutcome::of(&results),
            "alert dispatched"
        );
        results
    }
}
