use crate::auth::{self, PermissionLevel};
use crate::db::{ProjectRecord, SceneRecord};
use crate::error::OnAirError;
use crate::{fanout, AppState};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use live_events::{Event, SceneLiveUpdate};
use live_state::{ChannelId, ProjectName, SceneId};
use serde::{Deserialize, Serialize};
use tracing::info;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/api/scenes/:scene_id/push", post(push_scene))
		.route("/api/scenes/:scene_id/out", post(out_scene))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelBody {
	pub channel_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SceneCommandResponse {
	pub status: &'static str,
	pub scene_id: i64,
	pub channel_id: String,
}

/// Load the scene and its project, enforcing editor rights
async fn editable_scene(state: &AppState, headers: &HeaderMap, scene_id: i64) -> Result<(SceneRecord, ProjectRecord), OnAirError> {
	let user = auth::authenticate(&state.db, headers, state.config.token_secret()).await?;
	let scene = state.db.scene_by_id(scene_id).await?.ok_or(OnAirError::NotFound("scene"))?;
	let project = state.db.project_by_id(scene.project_id).await?.ok_or(OnAirError::NotFound("project"))?;
	auth::require_level(&state.db, &project, user.id, PermissionLevel::Editor).await?;
	Ok((scene, project))
}

/// Put a scene on air. Live siblings on the channel go off first; the
/// off events precede the on event in every room.
pub async fn push_scene(
	State(state): State<AppState>,
	Path(scene_id): Path<i64>,
	headers: HeaderMap,
	body: Option<Json<ChannelBody>>,
) -> Result<Json<SceneCommandResponse>, OnAirError> {
	let (scene, project) = editable_scene(&state, &headers, scene_id).await?;
	let channel = ChannelId::or_default(body.and_then(|Json(b)| b.channel_id));
	let project_key = ProjectName::new(project.name.clone());

	let transitions = state.live.push_scene_live(&project_key, &channel, SceneId::new(scene.id));

	let rooms = fanout::recipient_rooms(&state.db, &project).await?;
	for transition in transitions {
		let event = Event::SceneLiveUpdate(SceneLiveUpdate::now(transition.scene_id.as_i64(), transition.is_live, channel.as_str()));
		fanout::broadcast(&state.rooms, &rooms, &event);
	}

	info!(project = %project.name, scene_id = scene.id, channel = %channel, "scene pushed");
	Ok(Json(SceneCommandResponse {
		status: "success",
		scene_id: scene.id,
		channel_id: channel.to_string(),
	}))
}

/// Take a scene off air on the channel
pub async fn out_scene(
	State(state): State<AppState>,
	Path(scene_id): Path<i64>,
	headers: HeaderMap,
	body: Option<Json<ChannelBody>>,
) -> Result<Json<SceneCommandResponse>, OnAirError> {
	let (scene, project) = editable_scene(&state, &headers, scene_id).await?;
	let channel = ChannelId::or_default(body.and_then(|Json(b)| b.channel_id));
	let project_key = ProjectName::new(project.name.clone());

	state.live.set_scene_live(&project_key, &channel, SceneId::new(scene.id), false);

	let rooms = fanout::recipient_rooms(&state.db, &project).await?;
	let event = Event::SceneLiveUpdate(SceneLiveUpdate::now(scene.id, false, channel.as_str()));
	fanout::broadcast(&state.rooms, &rooms, &event);

	info!(project = %project.name, scene_id = scene.id, channel = %channel, "scene out");
	Ok(Json(SceneCommandResponse {
		status: "success",
		scene_id: scene.id,
		channel_id: channel.to_string(),
	}))
}
