use crate::timer::{TimeFormat, TimerRecord, TimerState};
use crate::types::{ChannelId, ObjectId, ProjectName, SceneId, StateKey};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

/// Scene on-air flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneFlag {
	pub is_live: bool,
	pub last_updated: f64,
}

/// Sparse property overlay for one object. Only keys explicitly written
/// since the last clear are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectOverride {
	pub properties: HashMap<String, Value>,
	pub last_updated: f64,
}

/// One scene-flag change observed by the control path during a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneTransition {
	pub scene_id: SceneId,
	pub is_live: bool,
}

/// Snapshot row handed to the ticker; `elapsed` is already projected
#[derive(Debug, Clone, PartialEq)]
pub struct RunningTimer {
	pub key: StateKey,
	pub object_id: ObjectId,
	pub elapsed: f64,
	pub time_format: TimeFormat,
}

#[derive(Debug, Default)]
struct ChannelState {
	scenes: HashMap<SceneId, SceneFlag>,
	objects: HashMap<ObjectId, ObjectOverride>,
	timers: HashMap<ObjectId, TimerRecord>,
}

/// In-memory, process-local live state, keyed by `(project, channel)`.
///
/// Each key's scene flags, object overrides and timer records live behind a
/// single map entry, so every public operation is atomic with respect to
/// other operations on the same key. Readers get cloned snapshots; no guard
/// is ever held across I/O. Nothing here survives process termination.
#[derive(Debug)]
pub struct LiveStateStore {
	channels: DashMap<StateKey, ChannelState>,
	epoch: Instant,
}

impl LiveStateStore {
	pub fn new() -> Self {
		Self {
			channels: DashMap::new(),
			epoch: Instant::now(),
		}
	}

	/// Server-monotonic seconds since the store was created
	fn now(&self) -> f64 {
		self.epoch.elapsed().as_secs_f64()
	}

	fn key(project: &ProjectName, channel: &ChannelId) -> StateKey {
		StateKey {
			project: project.clone(),
			channel: channel.clone(),
		}
	}

	// --- scene flags ---

	/// Write a single scene flag. Policy-free: siblings are untouched;
	/// the push path is responsible for exclusivity.
	pub fn set_scene_live(&self, project: &ProjectName, channel: &ChannelId, scene_id: SceneId, is_live: bool) {
		let now = self.now();
		let mut entry = self.channels.entry(Self::key(project, channel)).or_default();
		entry.scenes.insert(scene_id, SceneFlag { is_live, last_updated: now });
	}

	/// Put one scene on air: every live sibling goes off first, then the
	/// target goes live, all under one guard. Returns the flag changes in
	/// emission order (siblings off, target on).
	pub fn push_scene_live(&self, project: &ProjectName, channel: &ChannelId, scene_id: SceneId) -> Vec<SceneTransition> {
		let now = self.now();
		let mut entry = self.channels.entry(Self::key(project, channel)).or_default();

		let mut siblings: Vec<SceneId> = entry.scenes.iter().filter(|(id, flag)| **id != scene_id && flag.is_live).map(|(id, _)| *id).collect();
		siblings.sort_unstable();

		let mut transitions = Vec::with_capacity(siblings.len() + 1);
		for sibling in siblings {
			entry.scenes.insert(sibling, SceneFlag { is_live: false, last_updated: now });
			transitions.push(SceneTransition { scene_id: sibling, is_live: false });
		}

		entry.scenes.insert(scene_id, SceneFlag { is_live: true, last_updated: now });
		transitions.push(SceneTransition { scene_id, is_live: true });
		transitions
	}

	pub fn get_scene_live_state(&self, project: &ProjectName, channel: &ChannelId, scene_id: SceneId) -> bool {
		self
			.channels
			.get(&Self::key(project, channel))
			.and_then(|entry| entry.scenes.get(&scene_id).map(|flag| flag.is_live))
			.unwrap_or(false)
	}

	pub fn get_all_live_scenes(&self, project: &ProjectName, channel: &ChannelId) -> HashMap<SceneId, bool> {
		self
			.channels
			.get(&Self::key(project, channel))
			.map(|entry| entry.scenes.iter().map(|(id, flag)| (*id, flag.is_live)).collect())
			.unwrap_or_default()
	}

	// --- object overrides ---

	/// Write one property of one object's overlay; partial overlays compose
	/// by repeated calls.
	pub fn update_object_property(&self, project: &ProjectName, channel: &ChannelId, object_id: ObjectId, property: &str, value: Value) {
		let now = self.now();
		let mut entry = self.channels.entry(Self::key(project, channel)).or_default();
		let record = entry.objects.entry(object_id).or_default();

		record.properties.insert(property.to_owned(), value);
		record.last_updated = now;
	}

	pub fn get_object_property(&self, project: &ProjectName, channel: &ChannelId, object_id: ObjectId, property: &str) -> Option<Value> {
		self
			.channels
			.get(&Self::key(project, channel))
			.and_then(|entry| entry.objects.get(&object_id).and_then(|record| record.properties.get(property).cloned()))
	}

	/// Snapshot of every object overlay for the key, used by the merge path
	pub fn get_project_live_state(&self, project: &ProjectName, channel: &ChannelId) -> HashMap<ObjectId, ObjectOverride> {
		self
			.channels
			.get(&Self::key(project, channel))
			.map(|entry| entry.objects.clone())
			.unwrap_or_default()
	}

	// --- timers ---

	/// Start (or resume) a timer. A pre-existing record keeps its
	/// accumulated `elapsed`; a fresh one starts from zero.
	pub fn start_timer(&self, project: &ProjectName, channel: &ChannelId, object_id: ObjectId, time_format: TimeFormat) -> TimerRecord {
		let now = self.now();
		let mut entry = self.channels.entry(Self::key(project, channel)).or_default();

		let elapsed = entry.timers.get(&object_id).map_or(0.0, |record| record.elapsed);
		let record = TimerRecord {
			is_running: true,
			start_time: now,
			elapsed,
			time_format,
		};
		entry.timers.insert(object_id, record.clone());
		record
	}

	/// Stop a running timer, folding the current interval into `elapsed`.
	/// Idempotent when already stopped; returns the stored elapsed either
	/// way (zero for an unknown timer).
	pub fn stop_timer(&self, project: &ProjectName, channel: &ChannelId, object_id: ObjectId) -> f64 {
		let now = self.now();
		let Some(mut entry) = self.channels.get_mut(&Self::key(project, channel)) else {
			return 0.0;
		};
		let Some(record) = entry.timers.get_mut(&object_id) else {
			return 0.0;
		};

		if record.is_running {
			record.elapsed += now - record.start_time;
			record.is_running = false;
		}
		record.elapsed
	}

	/// Zero the timer while preserving its display format
	pub fn reset_timer(&self, project: &ProjectName, channel: &ChannelId, object_id: ObjectId) -> TimerRecord {
		let mut entry = self.channels.entry(Self::key(project, channel)).or_default();

		let time_format = entry.timers.get(&object_id).map_or_else(TimeFormat::default, |record| record.time_format);
		let record = TimerRecord::reset(time_format);
		entry.timers.insert(object_id, record.clone());
		record
	}

	/// Read-side projection; for running timers `elapsed` includes the
	/// in-flight interval without advancing `start_time`.
	pub fn get_timer_state(&self, project: &ProjectName, channel: &ChannelId, object_id: ObjectId, fallback_format: TimeFormat) -> TimerState {
		let now = self.now();
		let record = self
			.channels
			.get(&Self::key(project, channel))
			.and_then(|entry| entry.timers.get(&object_id).cloned());

		match record {
			Some(record) => {
				let elapsed = record.projected_elapsed(now);
				TimerState {
					is_running: record.is_running,
					elapsed,
					current_time: record.time_format.render(elapsed),
					time_format: record.time_format,
				}
			}
			None => TimerState {
				is_running: false,
				elapsed: 0.0,
				current_time: fallback_format.render(0.0),
				time_format: fallback_format,
			},
		}
	}

	/// Snapshot every running timer across all keys, projected at call time.
	/// Guards are taken per shard and released before the result is used.
	pub fn running_timers(&self) -> Vec<RunningTimer> {
		let now = self.now();
		let mut running = Vec::new();

		for entry in self.channels.iter() {
			for (object_id, record) in &entry.value().timers {
				if record.is_running {
					running.push(RunningTimer {
						key: entry.key().clone(),
						object_id: *object_id,
						elapsed: record.projected_elapsed(now),
						time_format: record.time_format,
					});
				}
			}
		}
		running
	}

	// --- lifecycle ---

	/// Drop every entry for the project. A `None` channel clears all
	/// channels; `Some` clears only that one.
	pub fn clear_project_live_state(&self, project: &ProjectName, channel: Option<&ChannelId>) {
		match channel {
			Some(channel) => {
				self.channels.remove(&Self::key(project, channel));
			}
			None => {
				self.channels.retain(|key, _| key.project != *project);
			}
		}
	}

	pub fn is_empty(&self) -> bool {
		self.channels.is_empty()
	}
}

impl Default for LiveStateStore {
	fn default() -> Self {
		Self::new()
	}
}
