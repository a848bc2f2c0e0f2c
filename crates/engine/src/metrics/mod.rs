pub mod exposition;
pub mod engine_metrics;

pub use engine_metrics::EngineMetrics;
