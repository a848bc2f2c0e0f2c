use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule::{AlertRule, Severity};
use super::sample::MetricSample;
use crate::notifier::DispatchResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub rule_name: String,
    pub metric: String,
    pub current_value: f64,
    pub threshold_value: f64,
    pub severity: Severity,
    pub status: EventStatus,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub deliveries: Vec<DispatchResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Triggered,
    Suppressed,
    Escalated,
    Resolved,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Suppressed => "suppressed",
            Self::Escalated => "escalated",
            Self::Resolved => "resolved",
        }
    }
}

impl AlertEvent {
    pub fn new(
        rule: &AlertRule,
        sample: &MetricSample,
        severity: Severity,
        status: EventStatus,
        breach_seconds: i64,
    ) -> Self {
        let message = match status {
            EventStatus::Resolved => format!(
                "{} recovered: {} is {:.2} (threshold {} {:.2})",
                rule.name,
                sample.metric,
                sample.value,
                rule.condition.symbol(),
                rule.threshold.value
            ),
            _ => format!(
                "{} {}: {} is {:.2} (threshold {} {:.2}) for {}m",
                rule.name,
                status.as_str(),
                sample.metric,
                sample.value,
                rule.condition.symbol(),
                rule.threshold.value,
                breach_seconds / 60
            ),
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            rule_name: rule.name.clone(),
            metric: sample.metric.clone(),
            current_value: sample.value,
            threshold_value: rule.threshold.value,
            severity,
            status,
            message,
            occurred_at: sample.observed_at,
            manual: false,
            deliveries: Vec::new(),
        }
    }

    /// Counts toward alert statistics: a notification-worthy transition.
    pub fn is_alert(&self) -> bool {
        matches!(self.status, EventStatus::Triggered | EventStatus::Escalated)
    }

    pub fn delivered(&self) -> bool {
        self.deliveries.iter().any(|d| d.success)
    }
}
