use serde::{Deserialize, Serialize};
use std::fmt;

/// Project key for live-state scoping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ProjectName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ProjectName {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for ProjectName {
	fn from(name: String) -> Self {
		Self(name)
	}
}

/// Logical output bus within a project; `default` when unspecified
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

pub const DEFAULT_CHANNEL: &str = "default";

impl ChannelId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Resolve an optional client-supplied channel to a concrete one
	pub fn or_default(id: Option<String>) -> Self {
		match id {
			Some(id) if !id.is_empty() => Self(id),
			_ => Self::default(),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Default for ChannelId {
	fn default() -> Self {
		Self(DEFAULT_CHANNEL.to_owned())
	}
}

impl fmt::Display for ChannelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ChannelId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(i64);

impl SceneId {
	pub const fn new(id: i64) -> Self {
		Self(id)
	}

	pub const fn as_i64(self) -> i64 {
		self.0
	}
}

impl fmt::Display for SceneId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(i64);

impl ObjectId {
	pub const fn new(id: i64) -> Self {
		Self(id)
	}

	pub const fn as_i64(self) -> i64 {
		self.0
	}
}

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Every live-state entry is scoped by `(project, channel)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
	pub project: ProjectName,
	pub channel: ChannelId,
}

impl StateKey {
	pub fn new(project: impl Into<ProjectName>, channel: impl Into<ChannelId>) -> Self {
		Self {
			project: project.into(),
			channel: channel.into(),
		}
	}
}

impl fmt::Display for StateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.project, self.channel)
	}
}
