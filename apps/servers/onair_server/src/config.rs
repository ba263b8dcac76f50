use clap::Parser;

/// Runtime configuration, resolved from flags and environment
#[derive(Debug, Clone, Parser)]
#[command(name = "onair_server", about = "Live state and broadcast core for on-air graphics overlays")]
pub struct Config {
	#[arg(long, env = "DATABASE_URL")]
	pub database_url: String,

	#[arg(long, env = "JWT_SECRET_KEY", default_value = "")]
	pub jwt_secret_key: String,

	/// Fallback signing secret, honored when JWT_SECRET_KEY is unset
	#[arg(long, env = "SECRET_KEY", default_value = "")]
	pub secret_key: String,

	#[arg(long, env = "PORT", default_value_t = 3000)]
	pub port: u16,

	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub rust_log: String,

	#[arg(long, env = "LOG_JSON", default_value_t = false)]
	pub log_json: bool,

	/// Request body cap in megabytes
	#[arg(long, env = "MAX_REQUEST_SIZE", default_value_t = 2)]
	pub max_request_size: usize,

	#[arg(long, env = "MAX_CONCURRENT_REQ", default_value_t = 256)]
	pub max_concurrent_req: usize,

	#[arg(long, env = "TASK_TIMEOUT_MS", default_value_t = 10_000)]
	pub task_timeout_ms: u64,
}

impl Config {
	/// The secret bearer tokens are validated against
	pub fn token_secret(&self) -> &str {
		if self.jwt_secret_key.is_empty() {
			&self.secret_key
		} else {
			&self.jwt_secret_key
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config_with(jwt: &str, secret: &str) -> Config {
		Config {
			database_url: "sqlite::memory:".to_owned(),
			jwt_secret_key: jwt.to_owned(),
			secret_key: secret.to_owned(),
			port: 3000,
			rust_log: "info".to_owned(),
			log_json: false,
			max_request_size: 2,
			max_concurrent_req: 256,
			task_timeout_ms: 10_000,
		}
	}

	#[test]
	fn jwt_secret_wins_over_fallback() {
		assert_eq!(config_with("a", "b").token_secret(), "a");
		assert_eq!(config_with("", "b").token_secret(), "b");
	}
}
