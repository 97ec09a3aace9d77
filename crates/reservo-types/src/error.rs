//! Error types shared by the server and all adapters.

use axum::{Json, http::StatusCode, response::IntoResponse};

pub type AbResult<T> = std::result::Result<T, Error>;

/// Platform-wide error surface. The auth and booking handlers that embed
/// this crate construct some variants (`NotFound`, `PermissionDenied`,
/// `Io`); the abuse subsystem only maps them to responses.
#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	/// Durable store failure (already logged at the call site)
	DbError,
	/// Counter cache returned a malformed or unexpected response
	CacheError,
	/// A backend is temporarily unreachable
	Unavailable,
	/// Caller-supplied input failed validation
	Validation(Box<str>),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::DbError => write!(f, "database error"),
			Error::CacheError => write!(f, "counter cache error"),
			Error::Unavailable => write!(f, "backend unavailable"),
			Error::Validation(msg) => write!(f, "validation error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		match self {
			Error::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
			Error::PermissionDenied => (StatusCode::FORBIDDEN, "permission denied").into_response(),
			Error::Validation(msg) => {
				let body = serde_json::json!({
					"error": { "code": "E-VALIDATION", "message": msg }
				});
				(StatusCode::BAD_REQUEST, Json(body)).into_response()
			}
			_ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
		}
	}
}


// vim: ts=4
