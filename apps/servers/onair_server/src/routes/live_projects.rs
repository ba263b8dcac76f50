use crate::auth::{self, PermissionLevel};
use crate::error::OnAirError;
use crate::{fanout, AppState};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use live_events::{Event, LiveStateCleared};
use live_state::{ChannelId, ObjectId, ObjectOverride, ProjectName, SceneId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/api/live/projects/:project_name/clear", post(clear_live_state))
		.route("/api/live/projects/:project_name/state", get(get_live_state))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearBody {
	pub channel_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
	pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
	pub channel_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LiveStateResponse {
	pub object_states: HashMap<ObjectId, ObjectOverride>,
	pub scene_states: HashMap<SceneId, bool>,
}

/// Drop the project's live state. Without a channel every channel goes;
/// with one, only that channel's entries.
pub async fn clear_live_state(
	State(state): State<AppState>,
	Path(project_name): Path<String>,
	headers: HeaderMap,
	body: Option<Json<ClearBody>>,
) -> Result<Json<ClearResponse>, OnAirError> {
	let user = auth::authenticate(&state.db, &headers, state.config.token_secret()).await?;
	let project = auth::resolve_project_for(&state.db, user.id, &project_name, PermissionLevel::Editor).await?;

	let channel = body.and_then(|Json(b)| b.channel_id).map(ChannelId::new);
	let project_key = ProjectName::new(project.name.clone());
	state.live.clear_project_live_state(&project_key, channel.as_ref());

	let rooms = fanout::recipient_rooms(&state.db, &project).await?;
	let event = Event::LiveStateCleared(LiveStateCleared::now(project.name.clone(), channel.as_ref().map(ToString::to_string)));
	fanout::broadcast(&state.rooms, &rooms, &event);

	let scope = channel.as_ref().map_or_else(|| "all channels".to_owned(), ToString::to_string);
	info!(project = %project.name, scope = %scope, "live state cleared");
	Ok(Json(ClearResponse {
		message: format!("live state cleared for {} ({scope})", project.name),
	}))
}

/// Snapshot of the project's live overrides and scene flags on one channel
pub async fn get_live_state(
	State(state): State<AppState>,
	Path(project_name): Path<String>,
	headers: HeaderMap,
	Query(query): Query<StateQuery>,
) -> Result<Json<LiveStateResponse>, OnAirError> {
	let user = auth::authenticate(&state.db, &headers, state.config.token_secret()).await?;
	let project = auth::resolve_project_for(&state.db, user.id, &project_name, PermissionLevel::Viewer).await?;

	let channel = ChannelId::or_default(query.channel_id);
	let project_key = ProjectName::new(project.name);

	Ok(Json(LiveStateResponse {
		object_states: state.live.get_project_live_state(&project_key, &channel),
		scene_states: state.live.get_all_live_scenes(&project_key, &channel),
	}))
}
