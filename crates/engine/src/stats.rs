use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::alert::{AlertEvent, ChannelKind, Severity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertStatistics {
    pub total_rules: usize,
    pub active_rules: usize,
    pub total_alerts: u64,
    pub alerts_sent_today: u64,
    pub by_severity: BTreeMap<Severity, u64>,
    pub by_channel: BTreeMap<ChannelKind, u64>,
    pub alert_rate_per_hour: f64,
}

/// Accumulates statistics over a stream of events.
pub(crate) struct StatsBuilder {
    stats: AlertStatistics,
    day_start: DateTime<Utc>,
    hour_ago: DateTime<Utc>,
    last_hour: u64,
}

impl StatsBuilder {
    pub(crate) fn new(total_rules: usize, active_rules: usize, now: DateTime<Utc>) -> Self {
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or(now);
        Self {
            stats: AlertStatistics {
                total_rules,
                active_rules,
                ..Default::default()
            },
            day_start,
            hour_ago: now - Duration::hours(1),
            last_hour: 0,
        }
    }

    pub(crate) fn observe(&mut self, event: &AlertEvent) {
        if !event.is_alert() {
            return;
        }
        self.stats.total_alerts += 1;
        *self.stats.by_severity.entry(event.severity).or_default() += 1;
        for d in event.deliveries.iter().filter(|d| d.success) {
            *self.stats.by_channel.entry(d.channel).or_default() += 1;
        }
        if event.occurred_at >= self.day_start && event.delivered() {
            self.stats.alerts_sent_today += 1;
        }
        if event.occurred_at >= self.hour_ago {
            self.last_hour += 1;
        }
    }

    pub(crate) fn finish(mut self) -> AlertStatistics {
        self.stats.alert_rate_per_hour = self.last_hour as f64;
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::EventStatus;
    use crate::notifier::DispatchResult;

    fn event(status: EventStatus, severity: Severity, at: DateTime<Utc>, delivered: &[(ChannelKind, bool)]) -> AlertEvent {
        AlertEvent {
            id: uuid::Uuid::new_v4().to_string(),
            rule_name: "cpu_high".into(),
            metric: "cpu_usage".into(),
            current_value: 90.0,
            threshold_value: 80.0,
            severity,
            status,
            message: String::new(),
            occurred_at: at,
            manual: false,
            deliveries: delivered
                .iter()
                .map(|(channel, success)| DispatchResult {
                    channel: *channel,
                    success: *success,
                    error: None,
                    sent_at: at,
                })
                .collect(),
        }
    }

    #[test]
    fn aggregates_alerts_only() {
        let now = DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z").unwrap().with_timezone(&Utc);
        let mut b = StatsBuilder::new(3, 2, now);
        b.observe(&event(EventStatus::Triggered, Severity::Medium, now - Duration::minutes(10), &[(ChannelKind::Email, false), (ChannelKind::Discord, true)]));
        b.observe(&event(EventStatus::Escalated, Severity::High, now - Duration::hours(2), &[(ChannelKind::Discord, true)]));
        b.observe(&event(EventStatus::Suppressed, Severity::Medium, now, &[]));
        b.observe(&event(EventStatus::Triggered, Severity::Medium, now - Duration::hours(20), &[(ChannelKind::Email, true)]));
        let stats = b.finish();

        assert_eq!(stats.total_rules, 3);
        assert_eq!(stats.active_rules, 2);
        assert_eq!(stats.total_alerts, 3);
        assert_eq!(stats.alerts_sent_today, 2);
        assert_eq!(stats.by_severity[&Severity::Medium], 2);
        assert_eq!(stats.by_severity[&Severity::High], 1);
        assert_eq!(stats.by_channel[&ChannelKind::Discord], 2);
        assert_eq!(stats.by_channel[&ChannelKind::Email], 1);
        assert_eq!(stats.alert_rate_per_hour, 1.0);
    }
}
