//! Gateway-owned routes.
//!
//! Business services are mounted behind the gateway by nesting their
//! routers here; the authorization middleware applies to all of them.

use axum::{Router, routing::get};

use crate::api::handlers::{health::health, whoami::whoami};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/whoami", get(whoami))
}
