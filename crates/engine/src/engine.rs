use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::alert::{
    AlertEvent, AlertRule, AlertRuleRegistry, AlertRuleState, AlertStateTracker, ChannelKind,
    EventLog, EventStatus, Evaluator, MetricSample, MetricSource, RuleFilter, RulePatch,
    RuleStatus, Severity, Transition,
};
use crate::error::{EngineError, EvaluationError};
use crate::metrics::EngineMetrics;
use crate::notifier::{DispatchOutcome, DispatchResult, NotificationDispatcher};
use crate::stats::{AlertStatistics, StatsBuilder};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Span of time one sample stands for; matches the scheduler tick.
    pub sample_interval: Duration,
    pub max_escalations: u32,
    pub notify_on_resolve: bool,
    pub history_retention: Duration,
    pub max_events_per_rule: usize,
    pub evaluation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(60),
            max_escalations: 3,
            notify_on_resolve: true,
            history_retention: Duration::from_secs(168 * 3600),
            max_events_per_rule: 1000,
            evaluation_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub rule_name: String,
    pub transition: Transition,
    pub status: RuleStatus,
    pub severity: Severity,
    pub skipped: bool,
    pub notified: bool,
    pub channels: Vec<ChannelKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<AlertEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFailure {
    pub rule_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<TransitionOutcome>,
    pub errors: Vec<RuleFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHealth {
    pub status: String,
    pub registry: ComponentHealth,
    pub dispatcher: ComponentHealth,
    pub channels: Vec<ChannelKind>,
}

/// Owns the registry, per-rule state, dispatcher and history.
pub struct AlertingEngine {
    registry: AlertRuleRegistry,
    tracker: AlertStateTracker,
    evaluator: Evaluator,
    dispatcher: NotificationDispatcher,
    history: EventLog,
    metrics: Arc<EngineMetrics>,
    config: EngineConfig,
}

impl AlertingEngine {
    pub fn new(config: EngineConfig, dispatcher: NotificationDispatcher) -> Self {
        let sample_interval = chrono::Duration::from_std(config.sample_interval)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));
        let retention = chrono::Duration::from_std(config.history_retention)
            .unwrap_or_else(|_| chrono::Duration::days(7));
        Self {
            registry: AlertRuleRegistry::new(),
            tracker: AlertStateTracker::new(),
            evaluator: Evaluator::new(sample_interval, config.max_escalations),
            dispatcher,
            history: EventLog::new(config.max_events_per_rule, retention),
            metrics: EngineMetrics::new(),
            config,
        }
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn add_rule(&self, rule: AlertRule) -> Result<AlertRule, EngineError> {
        let rule = self.registry.add(rule)?;
        tracing::info!(rule = %rule.name, metric = %rule.threshold.metric, "rule added");
        Ok(rule)
    }

    /// State is left untouched so an ongoing breach keeps its timing.
    pub fn update_rule(&self, name: &str, patch: RulePatch) -> Result<AlertRule, EngineError> {
        let rule = self.registry.update(name, patch)?;
        tracing::info!(rule = %rule.name, enabled = rule.enabled, "rule updated");
        Ok(rule)
    }

    /// Removes rule and state together, waiting for any in-flight evaluation.
    pub async fn remove_rule(&self, name: &str) -> Result<(), EngineError> {
        let handle = self.tracker.existing(name);
        let _guard = match &handle {
            Some(h) => Some(h.lock().await),
            None => None,
        };
        if self.registry.remove(name).is_none() {
            return Err(EngineError::RuleNotFound(name.to_string()));
        }
        self.tracker.remove(name);
        tracing::info!(rule = %name, "rule removed");
        Ok(())
    }

    pub fn get_rule(&self, name: &str) -> Result<AlertRule, EngineError> {
        self.registry
            .get(name)
            .ok_or_else(|| EngineError::RuleNotFound(name.to_string()))
    }

    pub fn list_rules(&self, filter: &RuleFilter) -> Vec<AlertRule> {
        self.registry.list(filter)
    }

    /// Current state of a rule; a never-evaluated rule reports a fresh state.
    pub async fn rule_state(&self, name: &str) -> Result<AlertRuleState, EngineError> {
        let rule = self.get_rule(name)?;
        Ok(self
            .tracker
            .snapshot(name)
            .await
            .unwrap_or_else(|| AlertRuleState::new(&rule.name, rule.severity)))
    }

    pub async fn evaluate(&self, rule_name: &str, sample: MetricSample) -> Result<TransitionOutcome, EngineError> {
        let base = self.get_rule(rule_name)?;
        let handle = self.tracker.handle(rule_name, base.severity);
        let mut state = handle.lock().await;

        // Re-read under the lock: the rule may have changed or gone meanwhile.
        let rule = match self.get_rule(rule_name) {
            Ok(rule) => rule,
            Err(e) => {
                // Removed after the first lookup; don't leave a fresh state behind.
                self.tracker.remove_if_same(rule_name, &handle);
                return Err(e);
            }
        };
        if !rule.enabled {
            return Ok(outcome(&rule, &state, Transition::None, true, None, None));
        }

        self.metrics.inc_evaluations();
        let eval = self
            .evaluator
            .evaluate(&rule, &state, &sample)
            .inspect_err(|_| self.metrics.inc_evaluation_errors())?;
        let mut next = eval.next;
        let transition = eval.transition;
        self.metrics.record_transition(transition);

        let status = match transition {
            Transition::None => {
                *state = next;
                return Ok(outcome(&rule, &state, transition, false, None, None));
            }
            Transition::Trigger => EventStatus::Triggered,
            Transition::Suppress => EventStatus::Suppressed,
            Transition::Escalate => EventStatus::Escalated,
            Transition::Resolve => EventStatus::Resolved,
        };

        let event_severity = match transition {
            Transition::Resolve => state.current_severity,
            _ => next.current_severity,
        };
        let mut event = AlertEvent::new(&rule, &sample, event_severity, status, next.consecutive_breach_seconds);

        let should_send = transition.notifies() || (transition == Transition::Resolve && self.config.notify_on_resolve);
        let mut dispatch = None;
        if should_send {
            event.deliveries = self.send(&rule, &event).await;
            dispatch = Some(DispatchOutcome::of(&event.deliveries));
        }
        if transition.notifies() {
            next.record_notification(sample.observed_at, rule.cooldown_minutes);
        }

        match transition {
            Transition::Suppress => tracing::debug!(rule = %rule.name, value = sample.value, "alert suppressed"),
            _ => tracing::info!(
                rule = %rule.name,
                transition = ?transition,
                severity = next.current_severity.as_str(),
                value = sample.value,
                "alert transition"
            ),
        }

        *state = next;
        self.history.append(event.clone());
        Ok(outcome(&rule, &state, transition, false, dispatch, Some(event)))
    }

    /// Evaluates every enabled rule (or the named subset) against `source`.
    /// A failing rule is reported in `errors` and does not stop the others.
    pub async fn evaluate_batch(&self, rule_names: Option<&[String]>, source: &dyn MetricSource) -> BatchReport {
        let mut report = BatchReport::default();
        let rules: Vec<AlertRule> = match rule_names {
            None => self.registry.list(&RuleFilter {
                enabled: Some(true),
                severity: None,
            }),
            Some(names) => {
                let mut rules = Vec::with_capacity(names.len());
                for name in names {
                    match self.registry.get(name) {
                        Some(rule) if rule.enabled => rules.push(rule),
                        Some(_) => {}
                        None => report.errors.push(RuleFailure {
                            rule_name: name.clone(),
                            error: EngineError::RuleNotFound(name.clone()).to_string(),
                        }),
                    }
                }
                rules
            }
        };

        let deadline = self.config.evaluation_timeout;
        let runs = rules.iter().map(|rule| async move {
            let result = tokio::time::timeout(deadline, async {
                let sample = source
                    .sample(&rule.threshold.metric)
                    .await
                    .ok_or_else(|| EvaluationError::NoSample(rule.threshold.metric.clone()))?;
                self.evaluate(&rule.name, sample).await
            })
            .await
            .unwrap_or(Err(EngineError::Evaluation(EvaluationError::Timeout(deadline))));
            (rule.name.clone(), result)
        });

        for (rule_name, result) in join_all(runs).await {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    tracing::warn!(rule = %rule_name, error = %e, "rule evaluation failed");
                    report.errors.push(RuleFailure {
                        rule_name,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Forces a dispatch regardless of state or cooldown. The rule's state is
    /// not touched; the event is still recorded.
    pub async fn send_manual(&self, rule_name: &str, sample: MetricSample) -> Result<Vec<DispatchResult>, EngineError> {
        let rule = self.get_rule(rule_name)?;
        let severity = self
            .tracker
            .snapshot(rule_name)
            .await
            .map(|s| s.current_severity)
            .unwrap_or(rule.severity);

        let mut event = AlertEvent::new(&rule, &sample, severity, EventStatus::Triggered, 0);
        event.manual = true;
        event.message = format!("manual alert for {}: {} = {:.2}", rule.name, sample.metric, sample.value);
        event.deliveries = self.send(&rule, &event).await;

        tracing::info!(rule = %rule.name, outcome = ?DispatchOutcome::of(&event.deliveries), "manual alert sent");
        let results = event.deliveries.clone();
        self.history.append(event);
        Ok(results)
    }

    pub fn history(&self, rule_name: &str, hours: u32) -> Result<Vec<AlertEvent>, EngineError> {
        self.history_at(rule_name, hours, Utc::now())
    }

    pub fn history_at(&self, rule_name: &str, hours: u32, now: DateTime<Utc>) -> Result<Vec<AlertEvent>, EngineError> {
        if !self.registry.contains(rule_name) {
            return Err(EngineError::RuleNotFound(rule_name.to_string()));
        }
        let since = chrono::Duration::try_hours(i64::from(hours))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(self.history.for_rule(rule_name, since))
    }

    pub fn statistics(&self) -> AlertStatistics {
        self.statistics_at(Utc::now())
    }

    pub fn statistics_at(&self, now: DateTime<Utc>) -> AlertStatistics {
        let mut builder = StatsBuilder::new(self.registry.count(), self.registry.count_enabled(), now);
        self.history.for_each(|e| builder.observe(e));
        builder.finish()
    }

    pub fn prune_history(&self, now: DateTime<Utc>) {
        self.history.prune(now);
    }

    pub fn health(&self) -> EngineHealth {
        let channels = self.dispatcher.channels();
        let dispatcher = if channels.is_empty() {
            ComponentHealth {
                status: "degraded".into(),
                detail: "no notification channels configured".into(),
            }
        } else {
            ComponentHealth {
                status: "ok".into(),
                detail: format!("{} channel(s), timeout {}ms", channels.len(), self.dispatcher.timeout().as_millis()),
            }
        };
        let registry = ComponentHealth {
            status: "ok".into(),
            detail: format!(
                "{} rule(s), {} enabled, {} tracked",
                self.registry.count(),
                self.registry.count_enabled(),
                self.tracker.len()
            ),
        };
        let status = if dispatcher.status == "ok" { "ok" } else { "degraded" };
        EngineHealth {
            status: status.into(),
            registry,
            dispatcher,
            channels,
        }
    }

    async fn send(&self, rule: &AlertRule, event: &AlertEvent) -> Vec<DispatchResult> {
        let start = Instant::now();
        let results = self.dispatcher.dispatch(rule, event).await;
        self.metrics.record_dispatch_latency(start);
        for r in &results {
            self.metrics.record_delivery(r.success);
        }
        results
    }
}

fn outcome(
    rule: &AlertRule,
    state: &AlertRuleState,
    transition: Transition,
    skipped: bool,
    dispatch: Option<DispatchOutcome>,
    event: Option<AlertEvent>,
) -> TransitionOutcome {
    let channels = event
        .as_ref()
        .map(|e| e.deliveries.iter().filter(|d| d.success).map(|d| d.channel).collect())
        .unwrap_or_default();
    TransitionOutcome {
        rule_name: rule.name.clone(),
        transition,
        status: state.status,
        severity: state.current_severity,
        skipped,
        notified: dispatch.is_some(),
        channels,
        dispatch,
        event,
    }
}
