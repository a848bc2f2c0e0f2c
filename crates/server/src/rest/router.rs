use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use vigil_engine::alert::MetricSource;
use vigil_engine::AlertingEngine;

use super::{alerts, health, metrics, rules};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AlertingEngine>,
    /// Used by `/api/alerts/evaluate` when the request carries no samples.
    pub probe: Arc<dyn MetricSource>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::metrics))
        .route("/api/alerts/health", get(health::health))
        .route("/api/alerts/rules", get(rules::list_rules).post(rules::create_rule))
        .route(
            "/api/alerts/rules/{name}",
            get(rules::get_rule)
                .put(rules::update_rule)
                .delete(rules::delete_rule),
        )
        .route("/api/alerts/rules/{name}/state", get(rules::rule_state))
        .route("/api/alerts/evaluate", post(alerts::evaluate))
        .route("/api/alerts/send", post(alerts::send))
        .route("/api/alerts/history/{name}", get(alerts::history))
        .route("/api/alerts/statistics", get(alerts::statistics))
        .with_state(state)
}
