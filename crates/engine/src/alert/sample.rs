use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub metric: String,
    pub value: f64,
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(metric: impl Into<String>, value: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            metric: metric.into(),
            value,
            observed_at,
        }
    }
}

/// Anything able to produce a current reading for a metric name.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn sample(&self, metric: &str) -> Option<MetricSample>;
}

/// Fixed readings, keyed by metric. Later samples for the same metric win.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    samples: HashMap<String, MetricSample>,
}

impl StaticSource {
    pub fn new(samples: impl IntoIterator<Item = MetricSample>) -> Self {
        let mut map = HashMap::new();
        for s in samples {
            map.insert(s.metric.clone(), s);
        }
        Self { samples: map }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[async_trait]
impl MetricSource for StaticSource {
    async fn sample(&self, metric: &str) -> Option<MetricSample> {
        self.samples.get(metric).cloned()
    }
}
