use crate::db::ObjectRecord;
use crate::error::OnAirError;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use live_state::{ChannelId, ObjectId, ObjectOverride, ProjectName};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub fn router() -> Router<AppState> {
	Router::new().route("/overlay/scenes/:scene_id", get(get_overlay_scene))
}

#[derive(Debug, Default, Deserialize)]
pub struct OverlayQuery {
	pub channel_id: Option<String>,
}

/// One scene object with live overrides already folded in
#[derive(Debug, Serialize)]
pub struct MergedObject {
	pub id: i64,
	pub name: String,
	#[serde(rename = "type")]
	pub object_type: String,
	pub order: i64,
	pub properties: Map<String, Value>,
	pub in_motion: Map<String, Value>,
	pub out_motion: Map<String, Value>,
	pub timing: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct MergedScene {
	pub id: i64,
	pub name: String,
	pub order: i64,
	pub project_id: i64,
	pub project_name: String,
	pub channel_id: String,
	pub objects: Vec<MergedObject>,
}

/// Overlay the live properties onto the baseline, key by key. Objects
/// without overrides pass through verbatim; a baseline key is never
/// removed, only shadowed.
fn merge_object(object: &ObjectRecord, overrides: &HashMap<ObjectId, ObjectOverride>) -> MergedObject {
	let mut properties = object.baseline_properties();
	if let Some(record) = overrides.get(&ObjectId::new(object.id)) {
		for (key, value) in &record.properties {
			properties.insert(key.clone(), value.clone());
		}
	}

	MergedObject {
		id: object.id,
		name: object.name.clone(),
		object_type: object.object_type.clone(),
		order: object.object_order,
		properties,
		in_motion: object.in_motion_json(),
		out_motion: object.out_motion_json(),
		timing: object.timing_json(),
	}
}

/// The overlay bootstrap read: persisted scene merged with the channel's
/// live overrides. Public by design; overlays are display endpoints.
pub async fn get_overlay_scene(
	State(state): State<AppState>,
	Path(scene_id): Path<i64>,
	Query(query): Query<OverlayQuery>,
) -> Result<Json<MergedScene>, OnAirError> {
	let scene = state.db.scene_by_id(scene_id).await?.ok_or(OnAirError::NotFound("scene"))?;
	let project = state.db.project_by_id(scene.project_id).await?.ok_or(OnAirError::NotFound("project"))?;
	let objects = state.db.scene_objects(scene.id).await?;

	let channel = ChannelId::or_default(query.channel_id);
	let project_key = ProjectName::new(project.name.clone());
	let overrides = state.live.get_project_live_state(&project_key, &channel);

	let merged = objects.iter().map(|object| merge_object(object, &overrides)).collect();

	Ok(Json(MergedScene {
		id: scene.id,
		name: scene.name,
		order: scene.scene_order,
		project_id: project.id,
		project_name: project.name,
		channel_id: channel.to_string(),
		objects: merged,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn text_object(id: i64, baseline: &str) -> ObjectRecord {
		ObjectRecord {
			id,
			name: "headline".to_owned(),
			object_type: "text".to_owned(),
			object_order: 0,
			properties: Some(baseline.to_owned()),
			in_motion: None,
			out_motion: None,
			timing: None,
			scene_id: 1,
		}
	}

	#[test]
	fn merge_shadows_baseline_key_by_key() {
		let object = text_object(42, r#"{"content": "Hello", "size": 24}"#);
		let mut overrides = HashMap::new();
		let mut record = ObjectOverride::default();
		record.properties.insert("content".to_owned(), json!("World"));
		overrides.insert(ObjectId::new(42), record);

		let merged = merge_object(&object, &overrides);

		assert_eq!(merged.properties.get("content"), Some(&json!("World")));
		// untouched baseline keys survive
		assert_eq!(merged.properties.get("size"), Some(&json!(24)));
	}

	#[test]
	fn objects_without_overrides_pass_through() {
		let object = text_object(42, r#"{"content": "Hello"}"#);
		let overrides = HashMap::new();

		let merged = merge_object(&object, &overrides);

		assert_eq!(merged.properties.get("content"), Some(&json!("Hello")));
		assert_eq!(merged.object_type, "text");
	}

	#[test]
	fn override_for_another_object_is_ignored() {
		let object = text_object(42, r#"{"content": "Hello"}"#);
		let mut overrides = HashMap::new();
		let mut record = ObjectOverride::default();
		record.properties.insert("content".to_owned(), json!("World"));
		overrides.insert(ObjectId::new(99), record);

		let merged = merge_object(&object, &overrides);

		assert_eq!(merged.properties.get("content"), Some(&json!("Hello")));
	}

	#[test]
	fn malformed_baseline_reads_as_empty() {
		let object = text_object(42, "not-json");
		let merged = merge_object(&object, &HashMap::new());

		assert!(merged.properties.is_empty());
	}
}
