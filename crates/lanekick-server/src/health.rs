use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sessions: SessionInfo,
    pub phases: usize,
}

#[derive(Serialize)]
pub struct SessionInfo {
    /// Sessions held in memory, including ended ones awaiting a flush.
    pub active: usize,
    pub max_active: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        sessions: SessionInfo {
            active: state.sessions.len().await,
            max_active: state.config.sessions.max_active,
        },
        phases: state.phases.len(),
    })
}
