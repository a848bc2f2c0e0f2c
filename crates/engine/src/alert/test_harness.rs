//! Replays a sample sequence through the evaluator without touching any
//! channel. Every notifying transition is treated as an attempted dispatch.

use super::evaluator::{Evaluator, Transition};
use super::rule::{AlertRule, Severity};
use super::sample::MetricSample;
use super::state::AlertRuleState;

#[derive(Debug, Default)]
pub struct HarnessResult {
    pub transitions: Vec<Transition>,
    pub severities: Vec<Severity>,
    pub triggered_count: usize,
    pub suppressed_count: usize,
    pub escalated_count: usize,
    pub resolved_count: usize,
    pub final_state: Option<AlertRuleState>,
}

pub fn run_harness(evaluator: &Evaluator, rule: &AlertRule, samples: &[MetricSample]) -> HarnessResult {
    let mut state = AlertRuleState::new(&rule.name, rule.severity);
    let mut result = HarnessResult::default();

    for sample in samples {
        let Ok(eval) = evaluator.evaluate(rule, &state, sample) else {
            continue;
        };
        state = eval.next;
        if eval.transition.notifies() {
            state.record_notification(sample.observed_at, rule.cooldown_minutes);
        }

        match eval.transition {
            Transition::Trigger => result.triggered_count += 1,
            Transition::Suppress => result.suppressed_count += 1,
            Transition::Escalate => result.escalated_count += 1,
            Transition::Resolve => result.resolved_count += 1,
            Transition::None => {}
        }
        result.transitions.push(eval.transition);
        result.severities.push(state.current_severity);
    }

    result.final_state = Some(state);
    result
}

/// One sample per minute starting at `start_min`, all with `value`.
pub fn minute_samples(metric: &str, start_min: i64, values: &[f64]) -> Vec<MetricSample> {
    let base = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            MetricSample::new(
                metric,
                *v,
                base + chrono::Duration::minutes(start_min + i as i64),
            )
        })
        .collect()
}
