use live_rooms::RoomRegistry;
use live_state::LiveStateStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod fanout;
pub mod routes;
pub mod ticker;
pub mod websocket;

pub use config::Config;
pub use error::OnAirError;

/// Process-wide context threaded through every handler and task
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub cancel_token: CancellationToken,
	pub db: db::Persistence,
	pub live: Arc<LiveStateStore>,
	pub rooms: Arc<RoomRegistry>,
}

impl AppState {
	/// Build the entire universe in one explicit place
	pub fn build(config: Arc<Config>, pool: SqlitePool, cancel_token: CancellationToken) -> Self {
		Self {
			config,
			cancel_token,
			db: db::Persistence::new(pool),
			live: Arc::new(LiveStateStore::new()),
			rooms: Arc::new(RoomRegistry::new()),
		}
	}
}
