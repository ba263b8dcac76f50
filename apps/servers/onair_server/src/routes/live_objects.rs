use crate::auth::{self, PermissionLevel};
use crate::db::{object_types, ObjectRecord, ProjectRecord};
use crate::error::OnAirError;
use crate::{fanout, AppState};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use live_events::{Event, ObjectLiveUpdate, TimerAction, TimerUpdate};
use live_state::{ChannelId, ObjectId, ProjectName, TimeFormat, TimerState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::info;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/api/live/objects/:object_id/text", post(update_text))
		.route("/api/live/objects/:object_id/image", post(update_image))
		.route("/api/live/objects/:object_id/shape", post(update_shape))
		.route("/api/live/objects/:object_id/timer/:action", post(timer_command))
}

#[derive(Debug, Deserialize)]
pub struct TextUpdateBody {
	pub project_name: String,
	pub channel_id: Option<String>,
	pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageUpdateBody {
	pub project_name: String,
	pub channel_id: Option<String>,
	pub src: String,
}

#[derive(Debug, Deserialize)]
pub struct ShapeUpdateBody {
	pub project_name: String,
	pub channel_id: Option<String>,
	pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct TimerCommandBody {
	pub project_name: String,
	pub channel_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PropertyUpdateResponse {
	pub object_id: i64,
	#[serde(flatten)]
	pub written: serde_json::Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct TimerCommandResponse {
	pub object_id: i64,
	pub timer_state: TimerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerCommand {
	Start,
	Stop,
	Reset,
}

impl FromStr for TimerCommand {
	type Err = OnAirError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"start" => Ok(Self::Start),
			"stop" => Ok(Self::Stop),
			"reset" => Ok(Self::Reset),
			other => Err(OnAirError::invalid_argument(format!("unknown timer action: {other}"))),
		}
	}
}

/// Load the object and verify it belongs to the named project, the caller
/// may edit it, and it carries the expected type tag.
async fn editable_object(state: &AppState, headers: &HeaderMap, object_id: i64, project_name: &str, expected_type: &str) -> Result<(ObjectRecord, ProjectRecord), OnAirError> {
	let user = auth::authenticate(&state.db, headers, state.config.token_secret()).await?;
	let object = state.db.object_by_id(object_id).await?.ok_or(OnAirError::NotFound("object"))?;
	let scene = state.db.scene_by_id(object.scene_id).await?.ok_or(OnAirError::NotFound("scene"))?;
	let project = state.db.project_by_id(scene.project_id).await?.ok_or(OnAirError::NotFound("project"))?;

	if project.name != project_name {
		return Err(OnAirError::invalid_argument(format!("object {object_id} does not belong to project {project_name}")));
	}

	auth::require_level(&state.db, &project, user.id, PermissionLevel::Editor).await?;

	if object.object_type != expected_type {
		return Err(OnAirError::invalid_argument(format!("expected a {expected_type} object, got {}", object.object_type)));
	}
	Ok((object, project))
}

/// Write one live property override and fan the change out
async fn apply_property_update(
	state: &AppState,
	project: &ProjectRecord,
	channel: &ChannelId,
	object_id: i64,
	property: &str,
	value: Value,
) -> Result<PropertyUpdateResponse, OnAirError> {
	let project_key = ProjectName::new(project.name.clone());
	state.live.update_object_property(&project_key, channel, ObjectId::new(object_id), property, value.clone());

	let rooms = fanout::recipient_rooms(&state.db, project).await?;
	let event = Event::ObjectLiveUpdate(ObjectLiveUpdate::now(object_id, property, value.clone(), channel.as_str()));
	fanout::broadcast(&state.rooms, &rooms, &event);

	info!(project = %project.name, object_id, property, channel = %channel, "live property updated");

	let mut written = serde_json::Map::new();
	written.insert(property.to_owned(), value);
	Ok(PropertyUpdateResponse { object_id, written })
}

pub async fn update_text(
	State(state): State<AppState>,
	Path(object_id): Path<i64>,
	headers: HeaderMap,
	Json(body): Json<TextUpdateBody>,
) -> Result<Json<PropertyUpdateResponse>, OnAirError> {
	let (_, project) = editable_object(&state, &headers, object_id, &body.project_name, object_types::TEXT).await?;
	let channel = ChannelId::or_default(body.channel_id);

	let response = apply_property_update(&state, &project, &channel, object_id, "content", Value::String(body.content)).await?;
	Ok(Json(response))
}

pub async fn update_image(
	State(state): State<AppState>,
	Path(object_id): Path<i64>,
	headers: HeaderMap,
	Json(body): Json<ImageUpdateBody>,
) -> Result<Json<PropertyUpdateResponse>, OnAirError> {
	let (_, project) = editable_object(&state, &headers, object_id, &body.project_name, object_types::IMAGE).await?;
	let channel = ChannelId::or_default(body.channel_id);

	let response = apply_property_update(&state, &project, &channel, object_id, "src", Value::String(body.src)).await?;
	Ok(Json(response))
}

pub async fn update_shape(
	State(state): State<AppState>,
	Path(object_id): Path<i64>,
	headers: HeaderMap,
	Json(body): Json<ShapeUpdateBody>,
) -> Result<Json<PropertyUpdateResponse>, OnAirError> {
	let (_, project) = editable_object(&state, &headers, object_id, &body.project_name, object_types::SHAPE).await?;
	let channel = ChannelId::or_default(body.channel_id);

	let response = apply_property_update(&state, &project, &channel, object_id, "color", Value::String(body.color)).await?;
	Ok(Json(response))
}

/// The timer face format is authored on the object itself
fn baseline_time_format(object: &ObjectRecord) -> TimeFormat {
	object
		.baseline_properties()
		.get("time_format")
		.and_then(Value::as_str)
		.and_then(|raw| raw.parse().ok())
		.unwrap_or_default()
}

pub async fn timer_command(
	State(state): State<AppState>,
	Path((object_id, action)): Path<(i64, String)>,
	headers: HeaderMap,
	Json(body): Json<TimerCommandBody>,
) -> Result<Json<TimerCommandResponse>, OnAirError> {
	let command: TimerCommand = action.parse()?;
	let (object, project) = editable_object(&state, &headers, object_id, &body.project_name, object_types::TIMER).await?;
	let channel = ChannelId::or_default(body.channel_id);
	let project_key = ProjectName::new(project.name.clone());
	let oid = ObjectId::new(object_id);

	let (timer_action, current_time, elapsed, time_format) = match command {
		TimerCommand::Start => {
			let record = state.live.start_timer(&project_key, &channel, oid, baseline_time_format(&object));
			(TimerAction::Start, record.time_format.render(record.elapsed), record.elapsed, record.time_format)
		}
		TimerCommand::Stop => {
			let elapsed = state.live.stop_timer(&project_key, &channel, oid);
			let format = state.live.get_timer_state(&project_key, &channel, oid, baseline_time_format(&object)).time_format;
			(TimerAction::Stop, format.render(elapsed), elapsed, format)
		}
		TimerCommand::Reset => {
			let record = state.live.reset_timer(&project_key, &channel, oid);
			(TimerAction::Reset, record.time_format.render(0.0), 0.0, record.time_format)
		}
	};

	let rooms = fanout::recipient_rooms(&state.db, &project).await?;
	let event = Event::TimerUpdate(TimerUpdate::now(object_id, timer_action, current_time, elapsed, time_format.as_str(), channel.as_str()));
	fanout::broadcast(&state.rooms, &rooms, &event);

	info!(project = %project.name, object_id, action = %timer_action, channel = %channel, "timer command applied");

	let timer_state = state.live.get_timer_state(&project_key, &channel, oid, time_format);
	Ok(Json(TimerCommandResponse { object_id, timer_state }))
}
