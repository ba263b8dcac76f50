use crate::db::{Persistence, ProjectRecord, UserRecord};
use crate::error::OnAirError;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use std::fmt;

/// Project permission grants, ordered by increasing authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
	Viewer,
	Editor,
	Owner,
}

impl PermissionLevel {
	pub fn parse(grant: &str) -> Option<Self> {
		match grant {
			"viewer" => Some(Self::Viewer),
			"editor" => Some(Self::Editor),
			"owner" => Some(Self::Owner),
			_ => None,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Viewer => "viewer",
			Self::Editor => "editor",
			Self::Owner => "owner",
		}
	}
}

impl fmt::Display for PermissionLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The token service writes the identity into `sub`, as a number or a
/// numeric string depending on issuer version; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubjectClaim {
	Num(i64),
	Str(String),
}

#[derive(Debug, Deserialize)]
struct Claims {
	sub: SubjectClaim,
}

impl Claims {
	fn user_id(&self) -> Result<i64, OnAirError> {
		match &self.sub {
			SubjectClaim::Num(id) => Ok(*id),
			SubjectClaim::Str(raw) => raw.parse().map_err(|_| OnAirError::Unauthenticated),
		}
	}
}

/// Pull the bearer token out of request headers, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|token| !token.is_empty())
}

/// Validate an HS256 token and return the user id it names.
/// Every failure collapses to `Unauthenticated`.
pub fn decode_user_id(token: &str, secret: &str) -> Result<i64, OnAirError> {
	let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default()).map_err(|_| OnAirError::Unauthenticated)?;
	data.claims.user_id()
}

/// Resolve the editor principal behind a request: bearer token to a user
/// row that still exists.
pub async fn authenticate(db: &Persistence, headers: &HeaderMap, secret: &str) -> Result<UserRecord, OnAirError> {
	let token = bearer_token(headers).ok_or(OnAirError::Unauthenticated)?;
	let user_id = decode_user_id(token, secret)?;
	db.user_by_id(user_id).await?.ok_or(OnAirError::Unauthenticated)
}

/// The caller's effective level on the project: implicit `owner` for the
/// owning account, else the explicit grant.
pub async fn permission_level(db: &Persistence, project: &ProjectRecord, user_id: i64) -> Result<Option<PermissionLevel>, OnAirError> {
	if project.user_id == user_id {
		return Ok(Some(PermissionLevel::Owner));
	}

	let grant = db.permission_of(project.id, user_id).await?;
	Ok(grant.as_deref().and_then(PermissionLevel::parse))
}

/// Enforce a minimum level; `Unauthorized` below it
pub async fn require_level(db: &Persistence, project: &ProjectRecord, user_id: i64, minimum: PermissionLevel) -> Result<PermissionLevel, OnAirError> {
	match permission_level(db, project, user_id).await? {
		Some(level) if level >= minimum => Ok(level),
		_ => Err(OnAirError::Unauthorized),
	}
}

/// Resolve a project by name as seen by the caller: the caller's own
/// project first, else any same-named project the caller holds a
/// sufficient grant on.
pub async fn resolve_project_for(db: &Persistence, user_id: i64, name: &str, minimum: PermissionLevel) -> Result<ProjectRecord, OnAirError> {
	if let Some(project) = db.project_of_owner(user_id, name).await? {
		return Ok(project);
	}

	let candidates = db.projects_by_name(name).await?;
	if candidates.is_empty() {
		return Err(OnAirError::NotFound("project"));
	}

	for project in candidates {
		if let Some(level) = permission_level(db, &project, user_id).await? {
			if level >= minimum {
				return Ok(project);
			}
		}
	}
	Err(OnAirError::Unauthorized)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;
	use jsonwebtoken::{encode, EncodingKey, Header};
	use serde::Serialize;

	#[derive(Serialize)]
	struct TestClaims {
		sub: i64,
		exp: i64,
	}

	#[derive(Serialize)]
	struct StringSubClaims {
		sub: String,
		exp: i64,
	}

	const SECRET: &str = "test-secret";
	const FAR_FUTURE: i64 = 4_102_444_800; // 2100-01-01

	fn token_for(sub: i64) -> String {
		encode(&Header::default(), &TestClaims { sub, exp: FAR_FUTURE }, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
	}

	#[test]
	fn levels_are_ordered_by_authority() {
		assert!(PermissionLevel::Viewer < PermissionLevel::Editor);
		assert!(PermissionLevel::Editor < PermissionLevel::Owner);
		assert_eq!(PermissionLevel::parse("editor"), Some(PermissionLevel::Editor));
		assert_eq!(PermissionLevel::parse("admin"), None);
		assert_eq!(PermissionLevel::Owner.as_str(), "owner");
	}

	#[test]
	fn decode_accepts_numeric_subject() {
		assert_eq!(decode_user_id(&token_for(7), SECRET).unwrap(), 7);
	}

	#[test]
	fn decode_accepts_string_subject() {
		let token = encode(
			&Header::default(),
			&StringSubClaims {
				sub: "7".to_owned(),
				exp: FAR_FUTURE,
			},
			&EncodingKey::from_secret(SECRET.as_bytes()),
		)
		.unwrap();

		assert_eq!(decode_user_id(&token, SECRET).unwrap(), 7);
	}

	#[test]
	fn decode_rejects_wrong_secret() {
		let token = token_for(7);
		assert!(matches!(decode_user_id(&token, "other-secret"), Err(OnAirError::Unauthenticated)));
	}

	#[test]
	fn decode_rejects_expired_token() {
		let token = encode(&Header::default(), &TestClaims { sub: 7, exp: 1 }, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
		assert!(matches!(decode_user_id(&token, SECRET), Err(OnAirError::Unauthenticated)));
	}

	#[test]
	fn bearer_extraction_requires_scheme() {
		let mut headers = HeaderMap::new();
		assert!(bearer_token(&headers).is_none());

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
		assert!(bearer_token(&headers).is_none());

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
		assert_eq!(bearer_token(&headers), Some("abc"));

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
		assert!(bearer_token(&headers).is_none());
	}
}
