use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_engine::alert::{AlertEvent, MetricSample, StaticSource};
use vigil_engine::notifier::{DispatchOutcome, DispatchResult};
use vigil_engine::{AlertStatistics, BatchReport};

use super::error::ApiError;
use super::router::AppState;

const DEFAULT_HISTORY_HOURS: u32 = 24;

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateRequest {
    /// Restricts evaluation to these rules; all enabled rules otherwise.
    #[serde(default)]
    pub rule_names: Option<Vec<String>>,
    /// Readings to evaluate against instead of the live probe.
    #[serde(default)]
    pub samples: Option<Vec<MetricSample>>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub rule_name: String,
    pub metric_data: ManualReading,
}

#[derive(Debug, Deserialize)]
pub struct ManualReading {
    /// Defaults to the rule's threshold metric.
    #[serde(default)]
    pub metric: Option<String>,
    pub value: f64,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub rule_name: String,
    pub outcome: DispatchOutcome,
    pub results: Vec<DispatchResult>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<u32>,
}

pub async fn evaluate(State(state): State<AppState>, Json(req): Json<EvaluateRequest>) -> Json<BatchReport> {
    let names = req.rule_names.as_deref();
    let report = match req.samples {
        Some(samples) => {
            let source = StaticSource::new(samples);
            state.engine.evaluate_batch(names, &source).await
        }
        None => state.engine.evaluate_batch(names, state.probe.as_ref()).await,
    };
    Json(report)
}

pub async fn send(State(state): State<AppState>, Json(req): Json<SendRequest>) -> Result<Json<SendResponse>, ApiError> {
    let rule = state.engine.get_rule(&req.rule_name)?;
    let reading = req.metric_data;
    let sample = MetricSample::new(
        reading.metric.unwrap_or(rule.threshold.metric),
        reading.value,
        reading.observed_at.unwrap_or_else(Utc::now),
    );
    let results = state.engine.send_manual(&rule.name, sample).await?;
    Ok(Json(SendResponse {
        rule_name: rule.name,
        outcome: DispatchOutcome::of(&results),
        results,
    }))
}

pub async fn history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<AlertEvent>>, ApiError> {
    let hours = q.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    Ok(Json(state.engine.history(&name, hours)?))
}

pub async fn statistics(State(state): State<AppState>) -> Json<AlertStatistics> {
    Json(state.engine.statistics())
}
