use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("unrecognized room name: {0}")]
pub struct RoomParseError(pub String);

/// Fan-out target. The three shapes the server addresses:
/// `project_<name>` (editor workspace), `user_<id>` (per-owner overlay
/// fan-out) and `user_<id>_channel_<id>` (one channel of one owner).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
	Project(String),
	User(i64),
	UserChannel(i64, String),
}

impl Room {
	pub fn project(name: impl Into<String>) -> Self {
		Self::Project(name.into())
	}

	pub const fn user(user_id: i64) -> Self {
		Self::User(user_id)
	}

	pub fn user_channel(user_id: i64, channel: impl Into<String>) -> Self {
		Self::UserChannel(user_id, channel.into())
	}
}

impl fmt::Display for Room {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Project(name) => write!(f, "project_{name}"),
			Self::User(user_id) => write!(f, "user_{user_id}"),
			Self::UserChannel(user_id, channel) => write!(f, "user_{user_id}_channel_{channel}"),
		}
	}
}

impl FromStr for Room {
	type Err = RoomParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Some(name) = s.strip_prefix("project_") {
			if !name.is_empty() {
				return Ok(Self::Project(name.to_owned()));
			}
		} else if let Some(rest) = s.strip_prefix("user_") {
			if let Some((user_id, channel)) = rest.split_once("_channel_") {
				if let (Ok(user_id), false) = (user_id.parse::<i64>(), channel.is_empty()) {
					return Ok(Self::UserChannel(user_id, channel.to_owned()));
				}
			} else if let Ok(user_id) = rest.parse::<i64>() {
				return Ok(Self::User(user_id));
			}
		}
		Err(RoomParseError(s.to_owned()))
	}
}
