//! Abuse Prevention Error Types
//!
//! Caller-facing rejection types for blocked and rate-limited addresses.
//! The core itself produces structured decisions; these types carry them
//! to the HTTP layer as generic "too many attempts" responses.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use reservo_types::abuse_adapter::OpClass;
use reservo_types::error::Error;

#[derive(Debug)]
pub enum AbuseError {
	/// Address is on the denylist
	Blocked {
		/// Remaining block duration; None means permanent
		remaining: Option<Duration>,
	},
	/// Address exceeded its quota for an operation class
	RateLimited { op: OpClass },
	/// Infrastructure failure while evaluating
	Internal(Error),
}

impl From<Error> for AbuseError {
	fn from(err: Error) -> Self {
		Self::Internal(err)
	}
}

impl std::fmt::Display for AbuseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AbuseError::Blocked { remaining: Some(dur) } => {
				write!(f, "Address blocked for {:?}", dur)
			}
			AbuseError::Blocked { remaining: None } => write!(f, "Address blocked permanently"),
			AbuseError::RateLimited { op } => write!(f, "Too many {} attempts", op),
			AbuseError::Internal(err) => write!(f, "Internal error: {}", err),
		}
	}
}

impl std::error::Error for AbuseError {}

impl IntoResponse for AbuseError {
	fn into_response(self) -> Response {
		match self {
			AbuseError::Blocked { remaining } => {
				let body = serde_json::json!({
					"error": {
						"code": "E-ABUSE-BLOCKED",
						"message": "Access temporarily blocked due to repeated violations.",
						"details": {
							"remainingSecs": remaining.map(|d| d.as_secs())
						}
					}
				});
				(StatusCode::FORBIDDEN, Json(body)).into_response()
			}
			AbuseError::RateLimited { op } => {
				let body = serde_json::json!({
					"error": {
						"code": "E-RATE-LIMITED",
						"message": "Too many attempts. Please try again later.",
						"details": {
							"operation": op.as_str()
						}
					}
				});
				(StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
			}
			AbuseError::Internal(err) => err.into_response(),
		}
	}
}


// vim: ts=4
