use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::rule::{AlertRule, RuleFilter, RulePatch};
use crate::error::EngineError;

/// Named rules, keyed by `AlertRule::name`.
#[derive(Clone, Default)]
pub struct AlertRuleRegistry {
    rules: Arc<DashMap<String, AlertRule>>,
}

impl AlertRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, mut rule: AlertRule) -> Result<AlertRule, EngineError> {
        rule.validate()?;
        match self.rules.entry(rule.name.clone()) {
            Entry::Occupied(_) => Err(EngineError::DuplicateRuleName(rule.name)),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                rule.created_at = now;
                rule.updated_at = now;
                slot.insert(rule.clone());
                Ok(rule)
            }
        }
    }

    pub fn update(&self, name: &str, patch: RulePatch) -> Result<AlertRule, EngineError> {
        let mut entry = self
            .rules
            .get_mut(name)
            .ok_or_else(|| EngineError::RuleNotFound(name.to_string()))?;
        let updated = entry.patched(patch)?;
        *entry = updated.clone();
        Ok(updated)
    }

    pub fn remove(&self, name: &str) -> Option<AlertRule> {
        self.rules.remove(name).map(|(_, rule)| rule)
    }

    pub fn get(&self, name: &str) -> Option<AlertRule> {
        self.rules.get(name).map(|r| r.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Matching rules sorted by name.
    pub fn list(&self, filter: &RuleFilter) -> Vec<AlertRule> {
        let mut rules: Vec<AlertRule> = self
            .rules
            .iter()
            .filter(|r| r.value().matches(filter))
            .map(|r| r.value().clone())
            .collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        rules
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    pub fn count_enabled(&self) -> usize {
        self.rules.iter().filter(|r| r.value().enabled).count()
    }
}
