use anyhow::Result;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::Router;
use clap::Parser;
use onair_server::{routes, ticker, websocket, AppState, Config};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::{limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, util::SubscriberInitExt, Layer};

async fn handle_tower_error(error: BoxError) -> (StatusCode, String) {
	if error.is::<tower::timeout::error::Elapsed>() {
		tracing::warn!("Request timeout: {}", error);
		(StatusCode::REQUEST_TIMEOUT, "request timeout".to_owned())
	} else if error.is::<tower::load_shed::error::Overloaded>() {
		tracing::warn!("Service overloaded: {}", error);
		(StatusCode::SERVICE_UNAVAILABLE, "service temporarily overloaded".to_owned())
	} else {
		tracing::error!("Unhandled tower error: {}", error);
		(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();
	let config = Config::parse();

	let _ = init_tracing(&config);

	if config.token_secret().is_empty() {
		anyhow::bail!("JWT_SECRET_KEY or SECRET_KEY must be set");
	}

	let config = Arc::new(config);
	let pool = SqlitePoolOptions::new().connect(&config.database_url).await?;
	let shutdown_token = CancellationToken::new();

	let app_state = AppState::build(config.clone(), pool, shutdown_token.clone());

	let ticker_task = ticker::spawn(app_state.clone());

	let app = Router::new()
		.merge(routes::router())
		.merge(websocket::router())
		.with_state(app_state.clone());

	let app = app.layer(
		ServiceBuilder::new()
			.layer(TraceLayer::new_for_http())
			.layer(HandleErrorLayer::new(|error: BoxError| async move { handle_tower_error(error).await }))
			.layer(RequestBodyLimitLayer::new(config.max_request_size * 1024 * 1024))
			.layer(ConcurrencyLimitLayer::new(config.max_concurrent_req))
			.layer(TimeoutLayer::new(Duration::from_millis(config.task_timeout_ms)))
			.layer(LoadShedLayer::new()),
	);

	let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
	let listener = TcpListener::bind(addr).await?;
	tracing::info!("listening on {}", listener.local_addr()?);

	// Spawn signal handler task with proper shutdown coordination
	let signal_shutdown_token = shutdown_token.clone();
	tokio::spawn(async move {
		tokio::signal::ctrl_c().await.ok();
		tracing::info!("Received Ctrl+C, initiating shutdown...");
		signal_shutdown_token.cancel();
	});

	let server_token = shutdown_token.clone();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		server_token.cancelled().await;
	});

	server.await?;
	tracing::info!("Server stopped");

	tracing::info!("Starting cleanup...");
	let cleanup = async {
		shutdown_token.cancel();
		let _ = ticker_task.await;
		tracing::info!("Timer ticker stopped");

		app_state.db.pool().close().await;
		tracing::info!("Database closed");
	};

	// Bound the cleanup to prevent an infinite hang
	match tokio::time::timeout(Duration::from_secs(5), cleanup).await {
		Ok(()) => tracing::info!("Graceful shutdown completed"),
		Err(_) => {
			tracing::error!("Shutdown timeout - forcing exit");
		}
	}

	tracing::info!("Shutdown complete");
	Ok(())
}

#[must_use]
pub fn init_tracing(config: &Config) -> Option<()> {
	use std::str::FromStr;
	use tracing_subscriber::layer::SubscriberExt;

	let filter = EnvFilter::from_str(&config.rust_log).ok()?;

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(
				tracing_subscriber::fmt::layer()
					.event_format(tracing_subscriber::fmt::format().pretty())
					.with_filter(filter),
			)
		})
		.init();
	Some(())
}
