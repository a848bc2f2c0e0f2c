use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::rule::AlertRule;
use super::sample::MetricSample;
use super::state::{AlertRuleState, RuleStatus};
use crate::error::EvaluationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    None,
    Trigger,
    Suppress,
    Escalate,
    Resolve,
}

impl Transition {
    /// Whether this transition asks for a dispatch to the rule's channels.
    pub fn notifies(&self) -> bool {
        matches!(self, Self::Trigger | Self::Escalate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub transition: Transition,
    pub next: AlertRuleState,
}

/// Pure decision function over (rule, state, sample).
#[derive(Debug, Clone)]
pub struct Evaluator {
    sample_interval: Duration,
    max_escalations: u32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Duration::seconds(60), 3)
    }
}

impl Evaluator {
    pub fn new(sample_interval: Duration, max_escalations: u32) -> Self {
        Self {
            sample_interval,
            max_escalations,
        }
    }

    pub fn evaluate(
        &self,
        rule: &AlertRule,
        state: &AlertRuleState,
        sample: &MetricSample,
    ) -> Result<Evaluation, EvaluationError> {
        if sample.metric != rule.threshold.metric {
            return Err(EvaluationError::MetricMismatch {
                expected: rule.threshold.metric.clone(),
                got: sample.metric.clone(),
            });
        }
        if !sample.value.is_finite() {
            return Err(EvaluationError::NonFiniteValue(sample.metric.clone()));
        }

        let now = sample.observed_at;
        let mut next = state.clone();
        next.last_evaluated_at = Some(now);

        if !rule.condition.evaluate(sample.value, rule.threshold.value) {
            let transition = if state.has_notified() {
                Transition::Resolve
            } else {
                Transition::None
            };
            next.reset(rule.severity);
            return Ok(Evaluation { transition, next });
        }

        // A sample covers the interval ending at its timestamp.
        let started = state
            .breach_started_at
            .unwrap_or_else(|| now.checked_sub_signed(self.sample_interval).unwrap_or(now));
        let elapsed = (now - started).max(Duration::zero());
        next.breach_started_at = Some(started);
        next.consecutive_breach_seconds = elapsed.num_seconds();

        let transition = if !state.has_notified() {
            if !reached(elapsed, rule.threshold.duration_minutes) {
                next.status = RuleStatus::Breaching;
                Transition::None
            } else if state.in_cooldown(now) {
                // Still pending: this breach has not been announced yet.
                next.status = RuleStatus::Breaching;
                Transition::Suppress
            } else {
                next.status = RuleStatus::Notified;
                Transition::Trigger
            }
        } else if self.escalation_due(rule, state, elapsed) {
            next.escalation_level += 1;
            next.current_severity = state.current_severity.escalate();
            next.status = RuleStatus::Escalated;
            Transition::Escalate
        } else if state.in_cooldown(now) {
            Transition::Suppress
        } else {
            next.status = RuleStatus::Notified;
            Transition::Trigger
        };

        Ok(Evaluation { transition, next })
    }

    fn escalation_due(&self, rule: &AlertRule, state: &AlertRuleState, elapsed: Duration) -> bool {
        if rule.escalation_minutes <= 0 || state.escalation_level >= self.max_escalations {
            return false;
        }
        let step = i64::from(state.escalation_level) + 1;
        rule.escalation_minutes
            .checked_mul(step)
            .is_some_and(|minutes| reached(elapsed, minutes))
    }
}

/// `elapsed >= minutes`; a window too large to represent is never reached.
fn reached(elapsed: Duration, minutes: i64) -> bool {
    Duration::try_minutes(minutes).is_some_and(|window| elapsed >= window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::rule::{Condition, Severity, Threshold};
    use chrono::{DateTime, Utc};

    fn t(min: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(min)
    }

    fn cpu_rule() -> AlertRule {
        AlertRule {
            name: "cpu_high".into(),
            description: String::new(),
            condition: Condition::GreaterThan,
            threshold: Threshold {
                metric: "cpu_usage".into(),
                value: 80.0,
                duration_minutes: 5,
            },
            severity: Severity::Medium,
            channels: Default::default(),
            cooldown_minutes: 30,
            escalation_minutes: 60,
            enabled: true,
            tags: Default::default(),
            created_at: t(0),
            updated_at: t(0),
        }
    }

    fn sample(min: i64, value: f64) -> MetricSample {
        MetricSample::new("cpu_usage", value, t(min))
    }

    #[test]
    fn first_breach_starts_timer() {
        let ev = Evaluator::default();
        let state = AlertRuleState::new("cpu_high", Severity::Medium);
        let out = ev.evaluate(&cpu_rule(), &state, &sample(1, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::None);
        assert_eq!(out.next.status, RuleStatus::Breaching);
        assert_eq!(out.next.breach_started_at, Some(t(0)));
        assert_eq!(out.next.consecutive_breach_seconds, 60);
    }

    #[test]
    fn triggers_once_duration_reached() {
        let ev = Evaluator::default();
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        let mut transitions = Vec::new();
        for m in 1..=5 {
            let out = ev.evaluate(&cpu_rule(), &state, &sample(m, 85.0)).unwrap();
            transitions.push(out.transition);
            state = out.next;
        }
        assert_eq!(&transitions[..4], &[Transition::None; 4]);
        assert_eq!(transitions[4], Transition::Trigger);
        assert_eq!(state.status, RuleStatus::Notified);
    }

    #[test]
    fn zero_duration_triggers_immediately() {
        let ev = Evaluator::default();
        let mut rule = cpu_rule();
        rule.threshold.duration_minutes = 0;
        let state = AlertRuleState::new("cpu_high", Severity::Medium);
        let out = ev.evaluate(&rule, &state, &sample(0, 90.0)).unwrap();
        assert_eq!(out.transition, Transition::Trigger);
    }

    #[test]
    fn cooldown_suppresses() {
        let ev = Evaluator::default();
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Cooldown;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.cooldown_until = Some(t(35));
        let out = ev.evaluate(&cpu_rule(), &state, &sample(10, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Suppress);
        assert_eq!(out.next.status, RuleStatus::Cooldown);
        assert_eq!(out.next.breach_started_at, Some(t(0)));
    }

    #[test]
    fn cooldown_expiry_renotifies() {
        let ev = Evaluator::default();
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Cooldown;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.cooldown_until = Some(t(35));
        let out = ev.evaluate(&cpu_rule(), &state, &sample(35, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Trigger);
        assert_eq!(out.next.status, RuleStatus::Notified);
    }

    #[test]
    fn escalation_bypasses_cooldown() {
        let ev = Evaluator::default();
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Cooldown;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.cooldown_until = Some(t(90));
        let out = ev.evaluate(&cpu_rule(), &state, &sample(60, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Escalate);
        assert_eq!(out.next.current_severity, Severity::High);
        assert_eq!(out.next.escalation_level, 1);
        assert_eq!(out.next.status, RuleStatus::Escalated);
    }

    #[test]
    fn escalation_happens_once_per_step() {
        let ev = Evaluator::default();
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Escalated;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.cooldown_until = Some(t(90));
        state.escalation_level = 1;
        state.current_severity = Severity::High;
        let out = ev.evaluate(&cpu_rule(), &state, &sample(61, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Suppress);
        assert_eq!(out.next.current_severity, Severity::High);
    }

    #[test]
    fn escalations_are_capped() {
        let ev = Evaluator::new(Duration::seconds(60), 1);
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Escalated;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.cooldown_until = Some(t(500));
        state.escalation_level = 1;
        let out = ev.evaluate(&cpu_rule(), &state, &sample(240, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Suppress);
    }

    #[test]
    fn escalation_disabled_when_zero() {
        let ev = Evaluator::default();
        let mut rule = cpu_rule();
        rule.escalation_minutes = 0;
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Cooldown;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.cooldown_until = Some(t(500));
        let out = ev.evaluate(&rule, &state, &sample(200, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Suppress);
    }

    #[test]
    fn resolution_after_notification() {
        let ev = Evaluator::default();
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Escalated;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.current_severity = Severity::Critical;
        let out = ev.evaluate(&cpu_rule(), &state, &sample(70, 70.0)).unwrap();
        assert_eq!(out.transition, Transition::Resolve);
        assert_eq!(out.next.status, RuleStatus::Idle);
        assert_eq!(out.next.current_severity, Severity::Medium);
        assert_eq!(out.next.breach_started_at, None);
    }

    #[test]
    fn unnotified_breach_resets_silently() {
        let ev = Evaluator::default();
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Breaching;
        state.breach_started_at = Some(t(0));
        let out = ev.evaluate(&cpu_rule(), &state, &sample(3, 50.0)).unwrap();
        assert_eq!(out.transition, Transition::None);
        assert_eq!(out.next.status, RuleStatus::Idle);
    }

    #[test]
    fn suppressed_breach_is_not_announced() {
        let ev = Evaluator::default();
        let mut rule = cpu_rule();
        rule.threshold.duration_minutes = 0;
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.cooldown_until = Some(t(30));

        let out = ev.evaluate(&rule, &state, &sample(10, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Suppress);
        assert_eq!(out.next.status, RuleStatus::Breaching);
        assert!(!out.next.has_notified());

        let out = ev.evaluate(&rule, &out.next, &sample(11, 10.0)).unwrap();
        assert_eq!(out.transition, Transition::None);
        assert_eq!(out.next.status, RuleStatus::Idle);
    }

    #[test]
    fn huge_windows_do_not_overflow() {
        let ev = Evaluator::default();
        let mut rule = cpu_rule();
        rule.threshold.duration_minutes = i64::MAX / 2;
        let state = AlertRuleState::new("cpu_high", Severity::Medium);
        let out = ev.evaluate(&rule, &state, &sample(1, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::None);

        let mut rule = cpu_rule();
        rule.escalation_minutes = i64::MAX;
        let mut state = AlertRuleState::new("cpu_high", Severity::Medium);
        state.status = RuleStatus::Escalated;
        state.notified_this_breach = true;
        state.breach_started_at = Some(t(0));
        state.escalation_level = 1;
        state.cooldown_until = Some(t(500));
        let out = ev.evaluate(&rule, &state, &sample(100, 85.0)).unwrap();
        assert_eq!(out.transition, Transition::Suppress);
    }

    #[test]
    fn sample_at_time_floor_does_not_panic() {
        let ev = Evaluator::default();
        let state = AlertRuleState::new("cpu_high", Severity::Medium);
        let s = MetricSample::new("cpu_usage", 85.0, DateTime::<Utc>::MIN_UTC);
        let out = ev.evaluate(&cpu_rule(), &state, &s).unwrap();
        assert_eq!(out.next.breach_started_at, Some(DateTime::<Utc>::MIN_UTC));
    }

    #[test]
    fn metric_mismatch_is_an_error() {
        let ev = Evaluator::default();
        let state = AlertRuleState::new("cpu_high", Severity::Medium);
        let s = MetricSample::new("memory_usage", 99.0, t(0));
        let err = ev.evaluate(&cpu_rule(), &state, &s).unwrap_err();
        assert!(matches!(err, EvaluationError::MetricMismatch { .. }));
    }

    #[test]
    fn nan_value_is_an_error() {
        let ev = Evaluator::default();
        let state = AlertRuleState::new("cpu_high", Severity::Medium);
        let err = ev
            .evaluate(&cpu_rule(), &state, &sample(0, f64::NAN))
            .unwrap_err();
        assert!(matches!(err, EvaluationError::NonFiniteValue(_)));
    }
}
