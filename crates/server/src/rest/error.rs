use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use vigil_engine::EngineError;

#[derive(Debug)]
pub struct ApiError(EngineError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            EngineError::RuleNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::DuplicateRuleName(_) => StatusCode::CONFLICT,
            EngineError::InvalidThreshold(_) | EngineError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn code(&self) -> &'static str {
        match self.0 {
            EngineError::RuleNotFound(_) => "rule_not_found",
            EngineError::DuplicateRuleName(_) => "duplicate_rule_name",
            EngineError::InvalidThreshold(_) => "invalid_threshold",
            EngineError::Evaluation(_) => "evaluation_failed",
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
