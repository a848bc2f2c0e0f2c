use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::alert::Transition;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    evaluations: AtomicU64,
    evaluation_errors: AtomicU64,
    alerts_triggered: AtomicU64,
    alerts_suppressed: AtomicU64,
    alerts_escalated: AtomicU64,
    alerts_resolved: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    dispatch_latency_sum_us: AtomicU64,
    dispatch_latency_count: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_evaluations(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_evaluation_errors(&self) {
        self.evaluation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self, transition: Transition) {
        let counter = match transition {
            Transition::Trigger => &self.alerts_triggered,
            Transition::Suppress => &self.alerts_suppressed,
            Transition::Escalate => &self.alerts_escalated,
            Transition::Resolve => &self.alerts_resolved,
            Transition::None => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self, success: bool) {
        if success {
            self.notifications_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notifications_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_dispatch_latency(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.dispatch_latency_sum_us.fetch_add(us, Ordering::Relaxed);
        self.dispatch_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evaluations_val(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn evaluation_errors_val(&self) -> u64 {
        self.evaluation_errors.load(Ordering::Relaxed)
    }

    pub fn alerts_triggered_val(&self) -> u64 {
        self.alerts_triggered.load(Ordering::Relaxed)
    }

    pub fn alerts_suppressed_val(&self) -> u64 {
        self.alerts_suppressed.load(Ordering::Relaxed)
    }

    pub fn alerts_escalated_val(&self) -> u64 {
        self.alerts_escalated.load(Ordering::Relaxed)
    }

    pub fn alerts_resolved_val(&self) -> u64 {
        self.alerts_resolved.load(Ordering::Relaxed)
    }

    pub fn notifications_sent_val(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn notifications_failed_val(&self) -> u64 {
        self.notifications_failed.load(Ordering::Relaxed)
    }

    pub fn dispatch_latency_vals(&self) -> (u64, u64) {
        (
            self.dispatch_latency_sum_us.load(Ordering::Relaxed),
            self.dispatch_latency_count.load(Ordering::Relaxed),
        )
    }
}
