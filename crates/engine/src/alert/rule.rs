use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::EngineError;

/// Upper bound for every minute-valued rule field: one year.
pub const MAX_WINDOW_MINUTES: i64 = 525_600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    pub threshold: Threshold,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub channels: BTreeSet<ChannelKind>,
    #[serde(default = "default_cooldown")]
    pub cooldown_minutes: i64,
    #[serde(default = "default_escalation")]
    pub escalation_minutes: i64,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Threshold {
    pub metric: String,
    pub value: f64,
    #[serde(default)]
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    GreaterThan,
    LessThan,
    Equals,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Email,
    Discord,
}

/// Partial update of a rule. The name is the registry key and cannot change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulePatch {
    pub description: Option<String>,
    pub condition: Option<Condition>,
    pub threshold: Option<Threshold>,
    pub severity: Option<Severity>,
    pub channels: Option<BTreeSet<ChannelKind>>,
    pub cooldown_minutes: Option<i64>,
    pub escalation_minutes: Option<i64>,
    pub enabled: Option<bool>,
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RuleFilter {
    pub enabled: Option<bool>,
    pub severity: Option<Severity>,
}

impl Condition {
    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::Equals => (value - threshold).abs() < f64::EPSILON,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equals => "==",
        }
    }
}

impl Severity {
    /// Next level up, clamped at `Critical`.
    pub fn escalate(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Discord => "discord",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AlertRule {
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| -> Result<(), EngineError> { Err(EngineError::InvalidThreshold(msg)) };

        if self.name.trim().is_empty() {
            return invalid("rule name must not be empty".into());
        }
        if self.threshold.metric.trim().is_empty() {
            return invalid("threshold.metric must not be empty".into());
        }
        if !self.threshold.value.is_finite() {
            return invalid(format!(
                "threshold.value must be a finite number for condition {:?}",
                self.condition
            ));
        }
        let windows = [
            ("threshold.duration_minutes", self.threshold.duration_minutes),
            ("cooldown_minutes", self.cooldown_minutes),
            ("escalation_minutes", self.escalation_minutes),
        ];
        for (field, minutes) in windows {
            if minutes < 0 {
                return invalid(format!("{field} must be >= 0"));
            }
            if minutes > MAX_WINDOW_MINUTES {
                return invalid(format!("{field} must be <= {MAX_WINDOW_MINUTES}"));
            }
        }
        Ok(())
    }

    pub fn matches(&self, filter: &RuleFilter) -> bool {
        filter.enabled.map_or(true, |e| e == self.enabled)
            && filter.severity.map_or(true, |s| s == self.severity)
    }

    /// Applies a patch and validates the result. On error `self` is untouched.
    pub fn patched(&self, patch: RulePatch) -> Result<Self, EngineError> {
        let mut next = self.clone();
        if let Some(v) = patch.description {
            next.description = v;
        }
        if let Some(v) = patch.condition {
            next.condition = v;
        }
        if let Some(v) = patch.threshold {
            next.threshold = v;
        }
        if let Some(v) = patch.severity {
            next.severity = v;
        }
        if let Some(v) = patch.channels {
            next.channels = v;
        }
        if let Some(v) = patch.cooldown_minutes {
            next.cooldown_minutes = v;
        }
        if let Some(v) = patch.escalation_minutes {
            next.escalation_minutes = v;
        }
        if let Some(v) = patch.enabled {
            next.enabled = v;
        }
        if let Some(v) = patch.tags {
            next.tags = v;
        }
        next.validate()?;
        next.updated_at = Utc::now();
        Ok(next)
    }
}

fn default_severity() -> Severity {
    Severity::Medium
}

fn default_cooldown() -> i64 {
    30
}

fn default_escalation() -> i64 {
    60
}

fn yes() -> bool {
    true
}
