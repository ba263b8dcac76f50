use crate::error::OnAirError;
use crate::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

pub fn router() -> Router<AppState> {
	Router::new().route("/api/health", get(get_health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub timestamp: String,
}

/// Liveness probe; fails when the persistence store is unreachable
pub async fn get_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, OnAirError> {
	state.db.ping().await?;

	Ok(Json(HealthResponse {
		status: "ok",
		timestamp: chrono::Utc::now().to_rfc3339(),
	}))
}
