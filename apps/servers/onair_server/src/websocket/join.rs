use crate::auth::{self, PermissionLevel};
use crate::error::OnAirError;
use crate::AppState;
use live_events::JoinRequest;
use live_rooms::{Room, SessionId};
use tracing::info;

/// Resolve a `join` request to the rooms the session may enter.
///
/// Resolution order:
/// 1. an explicit `room` is joined verbatim (it must parse as one of the
///    three room shapes),
/// 2. an authenticated client joins `project_<name>` and its own user
///    room (only the user room when `room_type` is `"user"`),
/// 3. an anonymous overlay names a public project and lands in the
///    owner's user room, preferring an explicit `user_id` binding.
pub async fn resolve_join(state: &AppState, session_id: &SessionId, header_user: Option<i64>, request: JoinRequest) -> Result<Vec<Room>, OnAirError> {
	if let Some(raw) = request.room {
		let room: Room = raw.parse().map_err(|_| OnAirError::invalid_argument(format!("unrecognized room: {raw}")))?;
		join_all(state, session_id, std::slice::from_ref(&room))?;
		info!(session = %session_id, room = %room, "joined explicit room");
		return Ok(vec![room]);
	}

	let project_name = request.project.ok_or_else(|| OnAirError::invalid_argument("join requires a project or a room".to_owned()))?;

	let payload_user = request.token.as_deref().and_then(|token| auth::decode_user_id(token, state.config.token_secret()).ok());

	if let Some(user_id) = header_user.or(payload_user) {
		return join_as_editor(state, session_id, user_id, &project_name, request.room_type.as_deref()).await;
	}
	join_as_overlay(state, session_id, &project_name, request.user_id).await
}

async fn join_as_editor(state: &AppState, session_id: &SessionId, user_id: i64, project_name: &str, room_type: Option<&str>) -> Result<Vec<Room>, OnAirError> {
	let user = state.db.user_by_id(user_id).await?.ok_or(OnAirError::Unauthenticated)?;
	let project = auth::resolve_project_for(&state.db, user.id, project_name, PermissionLevel::Viewer).await?;

	state.rooms.set_user(session_id, user.id).map_err(|e| OnAirError::Internal(e.into()))?;

	let rooms = if room_type == Some("user") {
		vec![Room::user(user.id)]
	} else {
		vec![Room::project(project.name.clone()), Room::user(user.id)]
	};
	join_all(state, session_id, &rooms)?;

	info!(session = %session_id, user = %user.username, project = %project.name, "editor joined");
	Ok(rooms)
}

async fn join_as_overlay(state: &AppState, session_id: &SessionId, project_name: &str, preferred_user: Option<i64>) -> Result<Vec<Room>, OnAirError> {
	let candidates = state.db.projects_by_name(project_name).await?;
	let project = candidates.first().ok_or(OnAirError::NotFound("project"))?;

	// an overlay that already knows its owner binding keeps it
	let owner = preferred_user.unwrap_or(project.user_id);
	let rooms = vec![Room::user(owner)];
	join_all(state, session_id, &rooms)?;

	info!(session = %session_id, project = %project.name, owner, "overlay joined");
	Ok(rooms)
}

fn join_all(state: &AppState, session_id: &SessionId, rooms: &[Room]) -> Result<(), OnAirError> {
	for room in rooms {
		state.rooms.join(session_id, room.clone()).map_err(|e| OnAirError::Internal(e.into()))?;
	}
	Ok(())
}
