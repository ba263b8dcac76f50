use crate::room::Room;
use crate::session::SessionId;
use dashmap::DashMap;
use live_events::Event;
use std::collections::HashSet;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error("unknown session: {0}")]
	UnknownSession(SessionId),
}

/// Per-emit delivery tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
	pub delivered: usize,
	pub failed: usize,
}

#[derive(Debug)]
struct SessionEntry {
	tx: UnboundedSender<String>,
	user_id: Option<i64>,
	rooms: HashSet<Room>,
}

/// Room membership and the delivery primitive.
///
/// Each session owns an unbounded channel feeding its socket writer, so
/// delivery to a single session is FIFO in emit order. Emission is
/// best-effort: a send to a departed session is dropped silently and only
/// counted. The registry holds its own locking and is never held across
/// await points by callers.
#[derive(Debug, Default)]
pub struct RoomRegistry {
	sessions: DashMap<SessionId, SessionEntry>,
	rooms: DashMap<Room, HashSet<SessionId>>,
}

impl RoomRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Admit a session; the receiver end feeds the session's socket writer
	pub fn register(&self, user_id: Option<i64>) -> (SessionId, UnboundedReceiver<String>) {
		let (tx, rx) = mpsc::unbounded_channel();
		let session_id = SessionId::new();

		self.sessions.insert(
			session_id.clone(),
			SessionEntry {
				tx,
				user_id,
				rooms: HashSet::new(),
			},
		);

		debug!(session = %session_id, authenticated = user_id.is_some(), "session registered");
		(session_id, rx)
	}

	/// Bind an authenticated user id after a successful join handshake
	pub fn set_user(&self, session_id: &SessionId, user_id: i64) -> Result<(), RegistryError> {
		let mut entry = self.sessions.get_mut(session_id).ok_or_else(|| RegistryError::UnknownSession(session_id.clone()))?;
		entry.user_id = Some(user_id);
		Ok(())
	}

	pub fn user_of(&self, session_id: &SessionId) -> Option<i64> {
		self.sessions.get(session_id).and_then(|entry| entry.user_id)
	}

	/// Idempotent room join
	pub fn join(&self, session_id: &SessionId, room: Room) -> Result<(), RegistryError> {
		let mut entry = self.sessions.get_mut(session_id).ok_or_else(|| RegistryError::UnknownSession(session_id.clone()))?;
		entry.rooms.insert(room.clone());
		drop(entry);

		self.rooms.entry(room.clone()).or_default().insert(session_id.clone());
		debug!(session = %session_id, room = %room, "joined room");
		Ok(())
	}

	/// Idempotent room leave; unknown sessions and rooms are ignored
	pub fn leave(&self, session_id: &SessionId, room: &Room) {
		if let Some(mut entry) = self.sessions.get_mut(session_id) {
			entry.rooms.remove(room);
		}
		if let Some(mut members) = self.rooms.get_mut(room) {
			members.remove(session_id);
		}
		self.rooms.remove_if(room, |_, members| members.is_empty());
	}

	pub fn rooms_of(&self, session_id: &SessionId) -> Vec<Room> {
		self
			.sessions
			.get(session_id)
			.map(|entry| entry.rooms.iter().cloned().collect())
			.unwrap_or_default()
	}

	pub fn members(&self, room: &Room) -> Vec<SessionId> {
		self.rooms.get(room).map(|members| members.iter().cloned().collect()).unwrap_or_default()
	}

	pub fn session_count(&self) -> usize {
		self.sessions.len()
	}

	/// Deliver an event to every session in the room. FIFO per session;
	/// no ordering across sessions. Failures are tallied, never raised.
	pub fn emit(&self, event: &Event, room: &Room) -> EmitReport {
		let frame = match event.to_frame() {
			Ok(frame) => frame,
			Err(e) => {
				warn!(event = %event.event_type(), error = %e, "failed to serialize event");
				return EmitReport { delivered: 0, failed: 0 };
			}
		};

		let members = self.members(room);
		let mut report = EmitReport::default();

		for session_id in members {
			match self.sessions.get(&session_id) {
				Some(entry) if entry.tx.send(frame.clone()).is_ok() => report.delivered += 1,
				_ => {
					// departed mid-emit; membership is swept on disconnect
					report.failed += 1;
					debug!(session = %session_id, room = %room, "dropped frame for departed session");
				}
			}
		}
		report
	}

	/// Deliver an event to one session only (`joined` / `error` replies)
	pub fn send_to(&self, session_id: &SessionId, event: &Event) -> bool {
		let Ok(frame) = event.to_frame() else {
			return false;
		};
		self.sessions.get(session_id).is_some_and(|entry| entry.tx.send(frame).is_ok())
	}

	/// Remove the session from every room and release its channel
	pub fn disconnect(&self, session_id: &SessionId) {
		let Some((_, entry)) = self.sessions.remove(session_id) else {
			return;
		};

		for room in &entry.rooms {
			if let Some(mut members) = self.rooms.get_mut(room) {
				members.remove(session_id);
			}
			self.rooms.remove_if(room, |_, members| members.is_empty());
		}
		debug!(session = %session_id, rooms = entry.rooms.len(), "session disconnected");
	}
}
