use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum OnAirError {
	#[error("{0} not found")]
	NotFound(&'static str),

	#[error("authentication required")]
	Unauthenticated,

	#[error("insufficient permission for this project")]
	Unauthorized,

	#[error("{0}")]
	InvalidArgument(String),

	/// Reserved for writers; the live core never raises it
	#[error("conflicting write")]
	Conflict,

	#[error("persistence unavailable: {0}")]
	Database(#[from] sqlx::Error),

	#[error("an internal server error occurred")]
	Internal(#[from] anyhow::Error),
}

impl OnAirError {
	pub fn invalid_argument(message: impl Into<String>) -> Self {
		Self::InvalidArgument(message.into())
	}

	/// Stable machine tag carried in the response body
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::NotFound(_) => "not_found",
			Self::Unauthenticated => "unauthenticated",
			Self::Unauthorized => "unauthorized",
			Self::InvalidArgument(_) => "invalid_argument",
			Self::Conflict => "conflict",
			Self::Database(_) | Self::Internal(_) => "internal",
		}
	}

	const fn status_code(&self) -> StatusCode {
		match self {
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::Unauthenticated => StatusCode::UNAUTHORIZED,
			Self::Unauthorized => StatusCode::FORBIDDEN,
			Self::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Conflict => StatusCode::CONFLICT,
			Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for OnAirError {
	fn into_response(self) -> Response {
		let message = match &self {
			Self::Database(e) => {
				tracing::error!(error = %e, "persistence failure");
				"persistence unavailable".to_owned()
			}
			Self::Internal(e) => {
				tracing::error!(error = ?e, "internal error");
				self.to_string()
			}
			_ => self.to_string(),
		};

		(self.status_code(), Json(json!({ "error": self.kind(), "message": message }))).into_response()
	}
}
