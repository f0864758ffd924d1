//! Bearer access-token verification.
//!
//! Responsibility:
//! - structural check of the `Authorization` value (`Bearer <jwt>`)
//! - signature, expiry (+ leeway), issuer and audience checks
//! - hand the raw claim set to the caller, untyped
//!
//! The empty-credential case is not handled here. The orchestrator routes
//! requests without a credential through the unauthenticated policy path
//! and never calls `verify` with an empty string.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from access-token verification. All of them are authentication
/// failures; `Expired` is split out so clients get an actionable cause.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid authorization header format")]
    MalformedHeader,

    #[error("token expired")]
    Expired,

    #[error("token verification failed: {0}")]
    Verification(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Verification(e),
        }
    }
}

/// Raw claims decoded from a verified token.
///
/// Produced once per request and discarded with it. Projection into an
/// application identity happens in [`crate::services::auth::Identity`].
#[derive(Debug, Clone)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Best-effort string coercion: strings pass through, numbers and
    /// booleans are stringified, anything else (including a missing
    /// claim) becomes the empty string.
    pub fn string_value(&self, name: &str) -> String {
        match self.0.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[cfg(test)]
    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// HS256 access-token verifier. Pure: verification depends only on the
/// credential, the clock, and key material fixed at startup.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: &str, issuer: &str, audience: &str, leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = leeway_seconds;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Verify the literal `Authorization` value and decode its claims.
    ///
    /// Checks run in order: structure, then signature, then expiry and
    /// issuer/audience via `jsonwebtoken::Validation`. No partial claim
    /// set is returned on failure.
    pub fn verify(&self, header_value: &str) -> Result<ClaimSet, AuthError> {
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedHeader)?;

        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;

        Ok(ClaimSet(data.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    const SECRET: &str = "test-secret";
    const ISSUER: &str = "gateway-test";
    const AUDIENCE: &str = "gateway-clients";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(SECRET, ISSUER, AUDIENCE, 0)
    }

    fn sign(secret: &str, claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp_offset_secs: i64) -> serde_json::Value {
        serde_json::json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": "user-1",
            "sid": "session-1",
            "role": "admin",
            "phone": "5550100",
            "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
        })
    }

    #[test]
    fn accepts_valid_token() {
        let token = sign(SECRET, &claims(3600));
        let set = verifier().verify(&format!("Bearer {token}")).unwrap();
        assert_eq!(set.string_value("sub"), "user-1");
        assert_eq!(set.string_value("role"), "admin");
    }

    #[test]
    fn rejects_missing_bearer_prefix() {
        let token = sign(SECRET, &claims(3600));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::MalformedHeader));
    }

    #[test]
    fn rejects_expired_token_as_expired() {
        let token = sign(SECRET, &claims(-3600));
        let err = verifier().verify(&format!("Bearer {token}")).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn rejects_tampered_signature() {
        let token = sign("other-secret", &claims(3600));
        let err = verifier().verify(&format!("Bearer {token}")).unwrap_err();
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn rejects_structurally_invalid_token() {
        let err = verifier().verify("Bearer not-a-jwt").unwrap_err();
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn rejects_wrong_audience() {
        let mut c = claims(3600);
        c["aud"] = serde_json::json!("someone-else");
        let token = sign(SECRET, &c);
        let err = verifier().verify(&format!("Bearer {token}")).unwrap_err();
        assert!(matches!(err, AuthError::Verification(_)));
    }
}
