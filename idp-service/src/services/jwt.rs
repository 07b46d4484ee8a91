use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use std::fs;

use service_core::auth::{AccessTokenClaims, Jwk, Jwks};
use service_core::error::AppError;
use service_core::identity::User;

use crate::config::JwtConfig;

/// Pregenerated development key, used when no key path is configured.
const DEV_PRIVATE_KEY_PEM: &str = include_str!("../../keys/dev_rsa.pem");

/// Signs multi-audience access tokens and publishes the matching JWKS.
///
/// The key pair is fixed for the process lifetime; rotation would mean
/// publishing a new key alongside the old one and is out of scope.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    jwks: Jwks,
    issuer: String,
    audiences: Vec<String>,
    token_expiry_seconds: i64,
}

impl TokenIssuer {
    pub fn new(
        config: &JwtConfig,
        issuer: &str,
        audiences: Vec<String>,
    ) -> Result<Self, AppError> {
        let pem = match &config.private_key_path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Failed to read private key from {}: {}",
                    path,
                    e
                ))
            })?,
            None => DEV_PRIVATE_KEY_PEM.to_string(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to parse private key: {}", e)))?;

        let jwks = jwks_from_pem(&pem)?;

        tracing::info!(issuer = %issuer, audiences = ?audiences, "Token issuer initialized with RS256 key");

        Ok(Self {
            encoding_key,
            jwks,
            issuer: issuer.to_string(),
            audiences,
            token_expiry_seconds: config.token_expiry_seconds,
        })
    }

    /// Sign an access token for a user. `aud` carries every registered
    /// resource server, so one sign-in authorizes the bearer against all of
    /// them; roles and organizations are a snapshot of the directory row at
    /// issuance time.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_expiry_seconds);

        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            aud: self.audiences.clone(),
            sub: user.username.clone(),
            roles: user.global_roles.iter().cloned().collect(),
            organizations: user.organizations.iter().cloned().collect(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let header = Header::new(Algorithm::RS256);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode access token: {}", e)))
    }

    /// The public key set for the `/jwks` endpoint.
    pub fn jwks(&self) -> &Jwks {
        &self.jwks
    }
}

/// Derive the JWKS representation (base64url modulus and exponent) from the
/// signing key PEM. Accepts PKCS#1 and PKCS#8, the same encodings
/// `EncodingKey::from_rsa_pem` takes, so any key the signer loads also
/// yields a key set.
fn jwks_from_pem(pem: &str) -> Result<Jwks, AppError> {
    let private_key = match RsaPrivateKey::from_pkcs1_pem(pem) {
        Ok(key) => key,
        Err(_) => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to parse RSA key: {}", e))
        })?,
    };
    let public_key = private_key.to_public_key();

    let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

    Ok(Jwks {
        keys: vec![Jwk {
            kty: "RSA".to_string(),
            key_use: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n,
            e,
        }],
    })
}
