use serde::{Deserialize, Serialize};

/// Verified claim set of an access token.
///
/// Fixed-shape on purpose: verification and RBAC code downstream relies on
/// these fields existing rather than digging through an open-ended map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer (the authorization server's canonical URL)
    pub iss: String,
    /// Every resource server URL this token is valid for (multi-audience SSO)
    pub aud: Vec<String>,
    /// Subject (username)
    pub sub: String,
    /// Global roles, snapshotted from the directory at issuance time
    #[serde(default)]
    pub roles: Vec<String>,
    /// Organization memberships, snapshotted at issuance time
    #[serde(default)]
    pub organizations: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}
