pub mod alert;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod notifier;
pub mod stats;

pub use engine::{AlertingEngine, BatchReport, EngineConfig, EngineHealth, RuleFailure, TransitionOutcome};
pub use error::{EngineError, EvaluationError};
pub use stats::AlertStatistics;
