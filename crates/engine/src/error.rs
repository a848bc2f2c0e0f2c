use std::time::Duration;

/// Errors surfaced to callers of the engine.
#[derive(Debug)]
pub enum EngineError {
    RuleNotFound(String),
    DuplicateRuleName(String),
    InvalidThreshold(String),
    Evaluation(EvaluationError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuleNotFound(name) => write!(f, "rule not found: {name}"),
            Self::DuplicateRuleName(name) => write!(f, "rule already exists: {name}"),
            Self::InvalidThreshold(msg) => write!(f, "invalid threshold: {msg}"),
            Self::Evaluation(e) => write!(f, "evaluation: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Evaluation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EvaluationError> for EngineError {
    fn from(e: EvaluationError) -> Self {
        Self::Evaluation(e)
    }
}

/// A single rule could not be evaluated. Batch evaluation records these and
/// moves on to the next rule.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    MetricMismatch { expected: String, got: String },
    NonFiniteValue(String),
    NoSample(String),
    Timeout(Duration),
}

impl std::fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MetricMismatch { expected, got } => {
                write!(f, "sample metric '{got}' does not match rule metric '{expected}'")
            }
            Self::NonFiniteValue(metric) => write!(f, "non-finite value for metric '{metric}'"),
            Self::NoSample(metric) => write!(f, "no sample available for metric '{metric}'"),
            Self::Timeout(d) => write!(f, "evaluation exceeded {}ms deadline", d.as_millis()),
        }
    }
}

impl std::error::Error for EvaluationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            EngineError::RuleNotFound("cpu_high".into()).to_string(),
            "rule not found: cpu_high"
        );
        assert!(EngineError::from(EvaluationError::NoSample("cpu".into()))
            .to_string()
            .contains("no sample"));
    }

    #[test]
    fn timeout_reports_millis() {
        let e = EvaluationError::Timeout(Duration::from_secs(2));
        assert!(e.to_string().contains("2000ms"));
    }
}
