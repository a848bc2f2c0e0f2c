use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use vigil_engine::alert::MetricSource;
use vigil_engine::AlertingEngine;

/// Periodic batch evaluation of every enabled rule.
pub struct EvaluationTask {
    pub interval: Duration,
    pub engine: Arc<AlertingEngine>,
    pub source: Arc<dyn MetricSource>,
}

pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl EvaluationTask {
    pub fn spawn(self) -> TaskHandle {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = self.engine.evaluate_batch(None, self.source.as_ref()).await;
                self.engine.prune_history(Utc::now());
                tracing::debug!(
                    evaluated = report.outcomes.len(),
                    failed = report.errors.len(),
                    "scheduled evaluation finished"
                );
            }
        });
        TaskHandle { handle }
    }
}
