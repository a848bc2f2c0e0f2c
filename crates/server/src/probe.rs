use async_trait::async_trait;
use chrono::Utc;
use sysinfo::System;
use tokio::sync::Mutex;

use vigil_engine::alert::{MetricSample, MetricSource};

pub const PROBE_METRICS: [&str; 4] = ["cpu_usage", "memory_usage", "load_average", "uptime_seconds"];

/// Host readings from `sysinfo`. Percentages are in 0..=100.
pub struct SystemProbe {
    sys: Mutex<System>,
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        // cpu usage is a delta between two refreshes; prime the first one.
        sys.refresh_cpu();
        sys.refresh_memory();
        Self { sys: Mutex::new(sys) }
    }

    async fn read(&self, metric: &str) -> Option<f64> {
        match metric {
            "cpu_usage" => {
                let mut sys = self.sys.lock().await;
                sys.refresh_cpu();
                Some(sys.global_cpu_info().cpu_usage() as f64)
            }
            "memory_usage" => {
                let mut sys = self.sys.lock().await;
                sys.refresh_memory();
                let total = sys.total_memory();
                if total == 0 {
                    return Some(0.0);
                }
                Some(sys.used_memory() as f64 / total as f64 * 100.0)
            }
            "load_average" => Some(System::load_average().one),
            "uptime_seconds" => Some(System::uptime() as f64),
            _ => None,
        }
    }
}

#[async_trait]
impl MetricSource for SystemProbe {
    async fn sample(&self, metric: &str) -> Option<MetricSample> {
        let value = self.read(metric).await?;
        Some(MetricSample::new(metric, value, Utc::now()))
    }
}
