use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event names as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
	SceneLiveUpdate,
	ObjectLiveUpdate,
	TimerUpdate,
	LiveStateCleared,
	Joined,
	Error,
}

impl EventType {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::SceneLiveUpdate => "scene_live_update",
			Self::ObjectLiveUpdate => "object_live_update",
			Self::TimerUpdate => "timer_update",
			Self::LiveStateCleared => "live_state_cleared",
			Self::Joined => "joined",
			Self::Error => "error",
		}
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Lifecycle tag carried by every `timer_update` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
	Start,
	Stop,
	Reset,
	Update,
}

impl fmt::Display for TimerAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::Start => "start",
			Self::Stop => "stop",
			Self::Reset => "reset",
			Self::Update => "update",
		};
		f.write_str(s)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLiveUpdate {
	pub scene_id: i64,
	pub is_live: bool,
	pub channel_id: String,
	pub timestamp: String,
}

impl SceneLiveUpdate {
	pub fn now(scene_id: i64, is_live: bool, channel_id: impl Into<String>) -> Self {
		Self {
			scene_id,
			is_live,
			channel_id: channel_id.into(),
			timestamp: iso_now(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLiveUpdate {
	pub object_id: i64,
	pub property: String,
	pub value: serde_json::Value,
	pub channel_id: String,
	pub timestamp: String,
}

impl ObjectLiveUpdate {
	pub fn now(object_id: i64, property: impl Into<String>, value: serde_json::Value, channel_id: impl Into<String>) -> Self {
		Self {
			object_id,
			property: property.into(),
			value,
			channel_id: channel_id.into(),
			timestamp: iso_now(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerUpdate {
	pub object_id: i64,
	pub action: TimerAction,
	pub current_time: String,
	pub elapsed: f64,
	pub time_format: String,
	pub channel_id: String,
	pub timestamp: String,
}

impl TimerUpdate {
	pub fn now(object_id: i64, action: TimerAction, current_time: impl Into<String>, elapsed: f64, time_format: impl Into<String>, channel_id: impl Into<String>) -> Self {
		Self {
			object_id,
			action,
			current_time: current_time.into(),
			elapsed,
			time_format: time_format.into(),
			channel_id: channel_id.into(),
			timestamp: iso_now(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStateCleared {
	pub project_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub channel_id: Option<String>,
	pub timestamp: String,
}

impl LiveStateCleared {
	pub fn now(project_name: impl Into<String>, channel_id: Option<String>) -> Self {
		Self {
			project_name: project_name.into(),
			channel_id,
			timestamp: iso_now(),
		}
	}
}

/// Sent only to the joining session; carries the resolved room names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedPayload {
	pub rooms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
}

impl ErrorPayload {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Outbound frame, serialized as `{"event": "...", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
	SceneLiveUpdate(SceneLiveUpdate),
	ObjectLiveUpdate(ObjectLiveUpdate),
	TimerUpdate(TimerUpdate),
	LiveStateCleared(LiveStateCleared),
	Joined(JoinedPayload),
	Error(ErrorPayload),
}

impl Event {
	pub const fn event_type(&self) -> EventType {
		match self {
			Self::SceneLiveUpdate(_) => EventType::SceneLiveUpdate,
			Self::ObjectLiveUpdate(_) => EventType::ObjectLiveUpdate,
			Self::TimerUpdate(_) => EventType::TimerUpdate,
			Self::LiveStateCleared(_) => EventType::LiveStateCleared,
			Self::Joined(_) => EventType::Joined,
			Self::Error(_) => EventType::Error,
		}
	}

	/// Serialize to the wire representation
	pub fn to_frame(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}

fn iso_now() -> String {
	Utc::now().to_rfc3339()
}
