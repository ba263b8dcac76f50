use serde_json::{Map, Value};
use sqlx::{FromRow, SqlitePool};

/// Object type tags the control surface validates against
pub mod object_types {
	pub const TEXT: &str = "text";
	pub const IMAGE: &str = "image";
	pub const SHAPE: &str = "shape";
	pub const TIMER: &str = "timer";
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
	pub id: i64,
	pub username: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectRecord {
	pub id: i64,
	pub name: String,
	pub user_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SceneRecord {
	pub id: i64,
	pub name: String,
	pub scene_order: i64,
	pub project_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ObjectRecord {
	pub id: i64,
	pub name: String,
	pub object_type: String,
	pub object_order: i64,
	pub properties: Option<String>,
	pub in_motion: Option<String>,
	pub out_motion: Option<String>,
	pub timing: Option<String>,
	pub scene_id: i64,
}

impl ObjectRecord {
	/// Baseline property record; a NULL or malformed column reads as empty
	pub fn baseline_properties(&self) -> Map<String, Value> {
		parse_json_column(self.properties.as_deref())
	}

	pub fn in_motion_json(&self) -> Map<String, Value> {
		parse_json_column(self.in_motion.as_deref())
	}

	pub fn out_motion_json(&self) -> Map<String, Value> {
		parse_json_column(self.out_motion.as_deref())
	}

	pub fn timing_json(&self) -> Map<String, Value> {
		parse_json_column(self.timing.as_deref())
	}
}

fn parse_json_column(column: Option<&str>) -> Map<String, Value> {
	column
		.and_then(|raw| serde_json::from_str::<Value>(raw).ok())
		.and_then(|value| match value {
			Value::Object(map) => Some(map),
			_ => None,
		})
		.unwrap_or_default()
}

/// Read-only adapter over the relational store. Identity, authorization
/// and baseline scene content come from here; the live core never writes.
#[derive(Debug, Clone)]
pub struct Persistence {
	pool: SqlitePool,
}

impl Persistence {
	pub const fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub const fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Connectivity probe for the health endpoint
	pub async fn ping(&self) -> Result<(), sqlx::Error> {
		sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await?;
		Ok(())
	}

	pub async fn user_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, sqlx::Error> {
		sqlx::query_as::<_, UserRecord>("SELECT id, username FROM users WHERE id = ?")
			.bind(user_id)
			.fetch_optional(&self.pool)
			.await
	}

	pub async fn project_by_id(&self, project_id: i64) -> Result<Option<ProjectRecord>, sqlx::Error> {
		sqlx::query_as::<_, ProjectRecord>("SELECT id, name, user_id FROM projects WHERE id = ?")
			.bind(project_id)
			.fetch_optional(&self.pool)
			.await
	}

	/// All projects carrying the name, across owners
	pub async fn projects_by_name(&self, name: &str) -> Result<Vec<ProjectRecord>, sqlx::Error> {
		sqlx::query_as::<_, ProjectRecord>("SELECT id, name, user_id FROM projects WHERE name = ? ORDER BY id")
			.bind(name)
			.fetch_all(&self.pool)
			.await
	}

	pub async fn project_of_owner(&self, owner_id: i64, name: &str) -> Result<Option<ProjectRecord>, sqlx::Error> {
		sqlx::query_as::<_, ProjectRecord>("SELECT id, name, user_id FROM projects WHERE user_id = ? AND name = ?")
			.bind(owner_id)
			.bind(name)
			.fetch_optional(&self.pool)
			.await
	}

	pub async fn scene_by_id(&self, scene_id: i64) -> Result<Option<SceneRecord>, sqlx::Error> {
		sqlx::query_as::<_, SceneRecord>(r#"SELECT id, name, "order" AS scene_order, project_id FROM scenes WHERE id = ?"#)
			.bind(scene_id)
			.fetch_optional(&self.pool)
			.await
	}

	pub async fn object_by_id(&self, object_id: i64) -> Result<Option<ObjectRecord>, sqlx::Error> {
		sqlx::query_as::<_, ObjectRecord>(
			r#"SELECT id, name, type AS object_type, "order" AS object_order, properties, in_motion, out_motion, timing, scene_id
			FROM objects WHERE id = ?"#,
		)
		.bind(object_id)
		.fetch_optional(&self.pool)
		.await
	}

	/// Scene objects in display order
	pub async fn scene_objects(&self, scene_id: i64) -> Result<Vec<ObjectRecord>, sqlx::Error> {
		sqlx::query_as::<_, ObjectRecord>(
			r#"SELECT id, name, type AS object_type, "order" AS object_order, properties, in_motion, out_motion, timing, scene_id
			FROM objects WHERE scene_id = ? ORDER BY "order", id"#,
		)
		.bind(scene_id)
		.fetch_all(&self.pool)
		.await
	}

	/// Explicit grant, if any. Ownership is resolved by the caller.
	pub async fn permission_of(&self, project_id: i64, user_id: i64) -> Result<Option<String>, sqlx::Error> {
		sqlx::query_scalar::<_, String>("SELECT permission FROM project_permissions WHERE project_id = ? AND user_id = ?")
			.bind(project_id)
			.bind(user_id)
			.fetch_optional(&self.pool)
			.await
	}

	/// Every account that must observe the project's events: the owner
	/// plus all grant holders, deduplicated.
	pub async fn project_members(&self, project_id: i64) -> Result<Vec<i64>, sqlx::Error> {
		sqlx::query_scalar::<_, i64>(
			"SELECT user_id FROM projects WHERE id = ?
			UNION
			SELECT user_id FROM project_permissions WHERE project_id = ?",
		)
		.bind(project_id)
		.bind(project_id)
		.fetch_all(&self.pool)
		.await
	}
}
