mod identity;
mod verifier;

pub use identity::Identity;
pub use verifier::{AuthError, ClaimSet, TokenVerifier};
