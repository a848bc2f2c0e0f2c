use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::rule::Severity;
use super::state::AlertRuleState;

pub type StateHandle = Arc<Mutex<AlertRuleState>>;

/// One lock-guarded state per rule, created on first use.
#[derive(Clone, Default)]
pub struct AlertStateTracker {
    states: Arc<DashMap<String, StateHandle>>,
}

impl AlertStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, rule_name: &str, base_severity: Severity) -> StateHandle {
        self.states
            .entry(rule_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(AlertRuleState::new(rule_name, base_severity))))
            .clone()
    }

    pub fn existing(&self, rule_name: &str) -> Option<StateHandle> {
        self.states.get(rule_name).map(|h| h.clone())
    }

    pub async fn snapshot(&self, rule_name: &str) -> Option<AlertRuleState> {
        let handle = self.existing(rule_name)?;
        let state = handle.lock().await;
        Some(state.clone())
    }

    pub fn remove(&self, rule_name: &str) -> bool {
        self.states.remove(rule_name).is_some()
    }

    /// Drops the entry only if it is still `handle`, leaving a newer state
    /// for a re-created rule in place.
    pub fn remove_if_same(&self, rule_name: &str, handle: &StateHandle) -> bool {
        self.states
            .remove_if(rule_name, |_, current| Arc::ptr_eq(current, handle))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
