use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use super::event::{AlertEvent, EventStatus};

/// In-memory event history, bounded per rule and by age.
#[derive(Clone)]
pub struct EventLog {
    events: Arc<DashMap<String, VecDeque<AlertEvent>>>,
    max_per_rule: usize,
    retention: Duration,
}

impl EventLog {
    pub fn new(max_per_rule: usize, retention: Duration) -> Self {
        Self {
            events: Arc::new(DashMap::new()),
            max_per_rule: max_per_rule.max(1),
            retention,
        }
    }

    /// At capacity the oldest suppressed event goes first, so a long breach
    /// cannot push its own alerts out of the log.
    pub fn append(&self, event: AlertEvent) {
        let cutoff = self.cutoff(event.occurred_at);
        let mut entry = self.events.entry(event.rule_name.clone()).or_default();
        while entry.front().is_some_and(|e| e.occurred_at < cutoff) {
            entry.pop_front();
        }
        if entry.len() >= self.max_per_rule {
            match entry.iter().position(|e| e.status == EventStatus::Suppressed) {
                Some(i) => {
                    entry.remove(i);
                }
                None => {
                    entry.pop_front();
                }
            }
        }
        entry.push_back(event);
    }

    /// Events for one rule at or after `since`, newest first.
    pub fn for_rule(&self, rule_name: &str, since: DateTime<Utc>) -> Vec<AlertEvent> {
        let Some(entry) = self.events.get(rule_name) else {
            return Vec::new();
        };
        let mut out: Vec<AlertEvent> = entry
            .iter()
            .filter(|e| e.occurred_at >= since)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        out
    }

    /// Visits every retained event. Holds one shard lock at a time.
    pub fn for_each(&self, mut f: impl FnMut(&AlertEvent)) {
        for entry in self.events.iter() {
            entry.value().iter().for_each(&mut f);
        }
    }

    pub fn len(&self) -> usize {
        self.events.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prune(&self, now: DateTime<Utc>) {
        let cutoff = self.cutoff(now);
        for mut entry in self.events.iter_mut() {
            entry.value_mut().retain(|e| e.occurred_at >= cutoff);
        }
        self.events.retain(|_, v| !v.is_empty());
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
