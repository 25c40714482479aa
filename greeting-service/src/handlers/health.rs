use crate::startup::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
}

/// Echo the greeting captured at startup. Never touches the cache.
pub async fn health_checker(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "success",
        message: state.greeting.to_string(),
    })
}
