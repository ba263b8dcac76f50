use crate::AppState;
use axum::Router;

pub mod health;
pub mod live_objects;
pub mod live_projects;
pub mod overlay;
pub mod scenes;

pub fn router() -> Router<AppState> {
	Router::new()
		.merge(scenes::router())
		.merge(live_objects::router())
		.merge(live_projects::router())
		.merge(overlay::router())
		.merge(health::router())
}
