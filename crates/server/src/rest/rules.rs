use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use vigil_engine::alert::{AlertRule, AlertRuleState, RuleFilter, RulePatch};

use super::error::ApiError;
use super::router::AppState;

pub async fn list_rules(State(state): State<AppState>, Query(filter): Query<RuleFilter>) -> Json<Vec<AlertRule>> {
    Json(state.engine.list_rules(&filter))
}

pub async fn get_rule(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<AlertRule>, ApiError> {
    Ok(Json(state.engine.get_rule(&name)?))
}

pub async fn create_rule(
    State(state): State<AppState>,
    Json(rule): Json<AlertRule>,
) -> Result<(StatusCode, Json<AlertRule>), ApiError> {
    let rule = state.engine.add_rule(rule)?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn update_rule(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(patch): Json<RulePatch>,
) -> Result<Json<AlertRule>, ApiError> {
    Ok(Json(state.engine.update_rule(&name, patch)?))
}

pub async fn delete_rule(State(state): State<AppState>, Path(name): Path<String>) -> Result<StatusCode, ApiError> {
    state.engine.remove_rule(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rule_state(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AlertRuleState>, ApiError> {
    Ok(Json(state.engine.rule_state(&name).await?))
}
