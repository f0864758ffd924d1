//! Application error taxonomy and the JSON error body.
//!
//! Responsibility:
//! - distinguish authentication failure (401), authorization denial (403)
//!   and policy-engine malfunction (500, fail closed)
//! - render every deny as `{code, message, data}` with a matching status

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::services::policy::PolicyError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, expired or otherwise rejected credential.
    #[error("{0}")]
    Unauthenticated(String),

    /// Well-formed identity, but no grant matches the request.
    #[error("permission denied")]
    PermissionDenied,

    /// The policy engine itself failed. Never treated as an allow; the
    /// request fails while the process keeps serving.
    #[error("authorization system error")]
    PolicyEngine(#[from] PolicyError),

    #[error("internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub data: Value,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::PolicyEngine(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            code: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: self.to_string(),
            data: Value::Null,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_the_taxonomy() {
        assert_eq!(
            AppError::Unauthenticated("missing token".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::PermissionDenied.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::PolicyEngine(PolicyError::Poisoned("poisoned".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
