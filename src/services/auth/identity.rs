//! Projection of raw claims into the identity used by the pipeline.

use serde::Serialize;

use super::verifier::ClaimSet;

/// Typed identity derived from a verified claim set.
///
/// Extraction is permissive: an absent or non-scalar claim maps to the
/// empty string. An empty `subject_id` or `role` is a degenerate but valid
/// identity; such a role simply matches no grant, so enforcement still
/// denies by default.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Identity {
    pub subject_id: String,
    pub session_id: String,
    pub role: String,
    pub contact: String,
}

impl Identity {
    pub fn from_claims(claims: &ClaimSet) -> Self {
        Self {
            subject_id: claims.string_value("sub"),
            session_id: claims.string_value("sid"),
            role: claims.string_value("role"),
            contact: claims.string_value("phone"),
        }
    }
}
