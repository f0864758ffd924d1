//! GET /whoami: echo the identity the pipeline attached to the request.

use axum::{Extension, Json};

use crate::error::AppError;
use crate::services::auth::Identity;

pub async fn whoami(identity: Option<Extension<Identity>>) -> Result<Json<Identity>, AppError> {
    // Reachable without an identity only through an unauthenticated grant.
    let Extension(identity) =
        identity.ok_or_else(|| AppError::Unauthenticated("missing token".into()))?;
    Ok(Json(identity))
}
