use crate::db::{Persistence, ProjectRecord};
use live_events::Event;
use live_rooms::{Room, RoomRegistry};
use tracing::{debug, warn};

/// Rooms that must observe a project's events: the editor workspace room
/// plus one user room per account with viewer-or-higher access, so
/// overlays running under any of those accounts receive the event.
pub async fn recipient_rooms(db: &Persistence, project: &ProjectRecord) -> Result<Vec<Room>, sqlx::Error> {
	let mut rooms = vec![Room::project(project.name.clone())];
	for user_id in db.project_members(project.id).await? {
		rooms.push(Room::user(user_id));
	}
	Ok(rooms)
}

/// Best-effort delivery to every room. Partial fan-out is tolerated;
/// clients recover by re-reading the merged scene.
pub fn broadcast(registry: &RoomRegistry, rooms: &[Room], event: &Event) {
	for room in rooms {
		let report = registry.emit(event, room);
		if report.failed > 0 {
			warn!(room = %room, event = %event.event_type(), failed = report.failed, delivered = report.delivered, "partial fan-out");
		} else if report.delivered > 0 {
			debug!(room = %room, event = %event.event_type(), delivered = report.delivered, "event emitted");
		}
	}
}
