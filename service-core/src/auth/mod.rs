pub mod claims;
pub mod middleware;
pub mod verifier;

pub use claims::AccessTokenClaims;
pub use middleware::{require_auth, AuthUser};
pub use verifier::{Jwk, Jwks, TokenVerifier};
