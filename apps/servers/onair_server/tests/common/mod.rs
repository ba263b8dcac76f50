#![allow(dead_code)] // shared across test binaries with different needs

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use onair_server::{routes, AppState, Config};
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

pub const SECRET: &str = "test-secret";

pub const ALICE: i64 = 1; // owns project "news"
pub const BOB: i64 = 2; // no grant on "news"
pub const CAROL: i64 = 3; // viewer grant on "news"

const SCHEMA: &[&str] = &[
	"CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT NOT NULL)",
	"CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT NOT NULL, user_id INTEGER NOT NULL)",
	r#"CREATE TABLE scenes (id INTEGER PRIMARY KEY, name TEXT NOT NULL, "order" INTEGER NOT NULL DEFAULT 0, project_id INTEGER NOT NULL)"#,
	r#"CREATE TABLE objects (id INTEGER PRIMARY KEY, name TEXT NOT NULL, type TEXT NOT NULL, "order" INTEGER NOT NULL DEFAULT 0, properties TEXT, in_motion TEXT, out_motion TEXT, timing TEXT, scene_id INTEGER NOT NULL)"#,
	"CREATE TABLE project_permissions (id INTEGER PRIMARY KEY, project_id INTEGER NOT NULL, user_id INTEGER NOT NULL, permission TEXT NOT NULL)",
];

const SEED: &[&str] = &[
	"INSERT INTO users (id, username) VALUES (1, 'alice'), (2, 'bob'), (3, 'carol')",
	"INSERT INTO projects (id, name, user_id) VALUES (1, 'news', 1), (2, 'sports', 2)",
	r#"INSERT INTO scenes (id, name, "order", project_id) VALUES (1, 'Lower Third', 0, 1), (2, 'Full Screen', 1, 1), (3, 'Scoreboard', 0, 2)"#,
	r##"INSERT INTO objects (id, name, type, "order", properties, scene_id) VALUES
		(42, 'headline', 'text', 0, '{"content": "Hello", "size": 24}', 1),
		(43, 'logo', 'image', 1, '{"src": "/media/logo.png"}', 1),
		(44, 'backplate', 'shape', 2, '{"color": "#102030"}', 1),
		(7, 'clock', 'timer', 3, '{"time_format": "MM:SS"}', 1)"##,
	"INSERT INTO project_permissions (id, project_id, user_id, permission) VALUES (1, 1, 3, 'viewer')",
];

pub fn test_config() -> Config {
	Config {
		database_url: "sqlite::memory:".to_owned(),
		jwt_secret_key: SECRET.to_owned(),
		secret_key: String::new(),
		port: 0,
		rust_log: "warn".to_owned(),
		log_json: false,
		max_request_size: 2,
		max_concurrent_req: 16,
		task_timeout_ms: 5_000,
	}
}

/// In-memory state with the seeded fixture schema
pub async fn test_state() -> AppState {
	let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();

	for statement in SCHEMA.iter().chain(SEED) {
		sqlx::query(statement).execute(&pool).await.unwrap();
	}

	AppState::build(Arc::new(test_config()), pool, CancellationToken::new())
}

pub fn app(state: &AppState) -> Router {
	Router::new().merge(routes::router()).with_state(state.clone())
}

#[derive(Serialize)]
struct TestClaims {
	sub: i64,
	exp: i64,
}

pub fn token_for(user_id: i64) -> String {
	let claims = TestClaims {
		sub: user_id,
		exp: 4_102_444_800, // 2100-01-01
	};
	encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
	let mut builder = Request::builder().method("POST").uri(uri).header(header::CONTENT_TYPE, "application/json");
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method("GET").uri(uri);
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

/// Pull every frame currently queued for a session
pub fn drain_frames(rx: &mut UnboundedReceiver<String>) -> Vec<Value> {
	let mut frames = Vec::new();
	while let Ok(frame) = rx.try_recv() {
		frames.push(serde_json::from_str(&frame).unwrap());
	}
	frames
}
