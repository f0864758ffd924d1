//! Per-request authorization: credential check → verification → claim
//! mapping → policy enforcement.
//!
//! Terminal outcomes:
//! - allow: the downstream handler runs, exactly once, with the verified
//!   `Identity` available in request extensions
//! - deny: a JSON error response is written and the chain stops
//!
//! Requests without a credential are evaluated against the configured
//! unauthenticated role first, so endpoints can be explicitly public. A
//! deny on that path is a 401 (`missing token`), not a second
//! verification attempt of an empty credential.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::Identity;
use crate::services::policy::PolicyDecision;
use crate::state::AppState;

/// Apply the authorization middleware to every route of the given router.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // The engine matches on the request path and method verbatim.
    let path = req.uri().path().to_string();
    let action = req.method().as_str().to_string();

    let credential = match req.headers().get(header::AUTHORIZATION) {
        None => "",
        Some(value) => value
            .to_str()
            .map_err(|_| AppError::Unauthenticated("invalid authorization header".into()))?,
    };

    if credential.is_empty() {
        let decision = enforce(&state, &state.unauthenticated_role, &path, &action)?;
        if decision.allowed {
            return Ok(next.run(req).await);
        }
        return Err(AppError::Unauthenticated("missing token".into()));
    }

    let claims = match state.verifier.verify(credential) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, path = %path, "access token verification failed");
            return Err(AppError::Unauthenticated(err.to_string()));
        }
    };

    let identity = Identity::from_claims(&claims);

    let decision = enforce(&state, &identity.role, &path, &action)?;
    if !decision.allowed {
        tracing::info!(
            subject = %identity.subject_id,
            role = %identity.role,
            path = %path,
            action = %action,
            "permission denied"
        );
        return Err(AppError::PermissionDenied);
    }

    // middleware → handler handoff
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Run the policy engine, converting an engine fault into a 500 that fails
/// the request closed. An engine error is never an allow and never a 403.
fn enforce(
    state: &AppState,
    role: &str,
    path: &str,
    action: &str,
) -> Result<PolicyDecision, AppError> {
    state.policy.enforce(role, path, action).map_err(|err| {
        tracing::error!(error = %err, role, path, action, "policy engine failure");
        AppError::PolicyEngine(err)
    })
}
