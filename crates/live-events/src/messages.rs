use serde::Deserialize;

/// Client-originated messages (commands from WebSocket clients)
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
	Join(JoinRequest),

	Pong,

	#[serde(other)]
	Unknown,
}

/// Payload of the `join` message; resolution rules live server-side
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequest {
	pub project: Option<String>,
	pub room: Option<String>,
	pub user_id: Option<i64>,
	pub room_type: Option<String>,
	pub token: Option<String>,
}
