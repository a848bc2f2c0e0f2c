use axum::extract::State;
use axum::Json;

use vigil_engine::EngineHealth;

use super::router::AppState;

/// Always 200; a missing channel shows up as `degraded` in the body.
pub async fn health(State(state): State<AppState>) -> Json<EngineHealth> {
    Json(state.engine.health())
}
