mod evaluator;
mod event;
mod history;
mod registry;
mod rule;
mod sample;
mod state;
mod tracker;
pub mod test_harness;

pub use evaluator::{Evaluation, Evaluator, Transition};
pub use event::{AlertEvent, EventStatus};
pub use history::EventLog;
pub use registry::AlertRuleRegistry;
pub use rule::{
    AlertRule, ChannelKind, Condition, RuleFilter, RulePatch, Severity, Threshold, MAX_WINDOW_MINUTES,
};
pub use sample::{MetricSample, MetricSource, StaticSource};
pub use state::{AlertRuleState, RuleStatus};
pub use tracker::{AlertStateTracker, StateHandle};
