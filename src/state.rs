//! Shared context bound to the Router (AppState).
//!
//! Clone-cheap by construction: the verifier and the policy engine are
//! behind Arcs, so every in-flight request shares one instance of each.

use std::sync::Arc;

use crate::services::auth::TokenVerifier;
use crate::services::policy::PolicyEngine;

#[derive(Clone, Debug)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub policy: PolicyEngine,
    /// Role evaluated for requests that present no credential.
    pub unauthenticated_role: Arc<str>,
}

impl AppState {
    pub fn new(
        verifier: Arc<TokenVerifier>,
        policy: PolicyEngine,
        unauthenticated_role: &str,
    ) -> Self {
        Self {
            verifier,
            policy,
            unauthenticated_role: unauthenticated_role.into(),
        }
    }
}
