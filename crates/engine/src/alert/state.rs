use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::rule::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Idle,
    Breaching,
    Notified,
    Cooldown,
    Escalated,
    Resolved,
}

/// Runtime state of one rule. Only mutated under the rule's lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRuleState {
    pub rule_name: String,
    pub status: RuleStatus,
    pub breach_started_at: Option<DateTime<Utc>>,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub current_severity: Severity,
    pub consecutive_breach_seconds: i64,
    pub escalation_level: u32,
    pub notifications_sent: u64,
    /// Set once the current breach has dispatched; cleared on reset.
    #[serde(default)]
    pub notified_this_breach: bool,
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

impl AlertRuleState {
    pub fn new(rule_name: impl Into<String>, base_severity: Severity) -> Self {
        Self {
            rule_name: rule_name.into(),
            status: RuleStatus::Idle,
            breach_started_at: None,
            last_notified_at: None,
            cooldown_until: None,
            current_severity: base_severity,
            consecutive_breach_seconds: 0,
            escalation_level: 0,
            notifications_sent: 0,
            notified_this_breach: false,
            last_evaluated_at: None,
        }
    }

    /// A notification went out for the current breach.
    pub fn has_notified(&self) -> bool {
        self.notified_this_breach
    }

    pub fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Clears breach tracking. `cooldown_until` and counters survive so a
    /// flapping rule stays rate-limited.
    pub fn reset(&mut self, base_severity: Severity) {
        self.status = RuleStatus::Idle;
        self.breach_started_at = None;
        self.current_severity = base_severity;
        self.consecutive_breach_seconds = 0;
        self.escalation_level = 0;
        self.notified_this_breach = false;
    }

    /// Records a dispatch attempt and opens a new cooldown window. A plain
    /// notification settles into `Cooldown`; an escalation stays `Escalated`.
    /// A window past the calendar saturates at `MAX_UTC`.
    pub fn record_notification(&mut self, now: DateTime<Utc>, cooldown_minutes: i64) {
        let until = Duration::try_minutes(cooldown_minutes)
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.last_notified_at = Some(now);
        self.cooldown_until = Some(until);
        self.notifications_sent += 1;
        self.notified_this_breach = true;
        if self.status == RuleStatus::Notified {
            self.status = RuleStatus::Cooldown;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(min: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(min)
    }

    #[test]
    fn fresh_state_is_idle() {
        let s = AlertRuleState::new("cpu_high", Severity::High);
        assert_eq!(s.status, RuleStatus::Idle);
        assert_eq!(s.current_severity, Severity::High);
        assert!(!s.has_notified());
        assert!(!s.in_cooldown(t(0)));
    }

    #[test]
    fn notification_opens_cooldown() {
        let mut s = AlertRuleState::new("cpu_high", Severity::Medium);
        s.status = RuleStatus::Notified;
        s.record_notification(t(0), 30);
        assert_eq!(s.status, RuleStatus::Cooldown);
        assert!(s.in_cooldown(t(29)));
        assert!(!s.in_cooldown(t(30)));
        assert_eq!(s.notifications_sent, 1);
        assert!(s.has_notified());
    }

    #[test]
    fn oversized_cooldown_saturates() {
        let mut s = AlertRuleState::new("cpu_high", Severity::Medium);
        s.record_notification(t(0), i64::MAX / 2);
        assert_eq!(s.cooldown_until, Some(DateTime::<Utc>::MAX_UTC));
        assert!(s.in_cooldown(t(1_000_000)));
    }

    #[test]
    fn escalated_status_is_kept_after_notification() {
        let mut s = AlertRuleState::new("cpu_high", Severity::Medium);
        s.status = RuleStatus::Escalated;
        s.record_notification(t(0), 30);
        assert_eq!(s.status, RuleStatus::Escalated);
    }

    #[test]
    fn reset_keeps_cooldown() {
        let mut s = AlertRuleState::new("cpu_high", Severity::Medium);
        s.status = RuleStatus::Escalated;
        s.breach_started_at = Some(t(0));
        s.current_severity = Severity::Critical;
        s.escalation_level = 2;
        s.cooldown_until = Some(t(30));
        s.notified_this_breach = true;
        s.reset(Severity::Medium);
        assert_eq!(s.status, RuleStatus::Idle);
        assert_eq!(s.breach_started_at, None);
        assert_eq!(s.current_severity, Severity::Medium);
        assert_eq!(s.escalation_level, 0);
        assert_eq!(s.cooldown_until, Some(t(30)));
        assert!(!s.has_notified());
    }
}
