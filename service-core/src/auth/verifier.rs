use std::time::Duration;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::auth::claims::AccessTokenClaims;
use crate::error::AppError;

/// A single RSA public key in JWKS representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Base64url-encoded modulus
    pub n: String,
    /// Base64url-encoded public exponent
    pub e: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Clone)]
struct CachedJwks {
    jwks: Jwks,
    fetched_at: Instant,
}

/// Per-resource-server token verifier.
///
/// Validates signature (against keys fetched from the issuer's JWKS
/// endpoint), issuer, audience membership and expiry. Every failure collapses
/// into [`AppError::TokenVerificationFailed`]; no partial claims escape. This
/// is the trust boundary between network input and the access control layer.
pub struct TokenVerifier {
    jwks_uri: String,
    issuer: String,
    audience: String,
    http: reqwest::Client,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedJwks>>,
}

impl TokenVerifier {
    pub fn new(jwks_uri: &str, issuer: &str, audience: &str) -> Self {
        Self {
            jwks_uri: jwks_uri.to_string(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            http: reqwest::Client::new(),
            cache_ttl: Duration::from_secs(300),
            cache: RwLock::new(None),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verify a raw bearer token and return its claims.
    pub async fn verify(&self, raw_token: &str) -> Result<AccessTokenClaims, AppError> {
        let (jwks, from_cache) = self.current_keys().await.map_err(|err| {
            tracing::warn!(error = %err, jwks_uri = %self.jwks_uri, "JWKS fetch failed");
            AppError::TokenVerificationFailed
        })?;

        match self.decode_against(&jwks, raw_token) {
            Ok(claims) => Ok(claims),
            Err(err) if from_cache => {
                // The cached key material may be stale (e.g. the issuer
                // restarted with a new key). Force one fresh fetch and retry
                // before rejecting.
                tracing::debug!(error = %err, "verification failed with cached JWKS, refetching");
                let jwks = self.fetch_and_store().await.map_err(|err| {
                    tracing::warn!(error = %err, "JWKS refetch failed");
                    AppError::TokenVerificationFailed
                })?;
                self.decode_against(&jwks, raw_token).map_err(|err| {
                    tracing::debug!(error = %err, "token rejected");
                    AppError::TokenVerificationFailed
                })
            }
            Err(err) => {
                tracing::debug!(error = %err, "token rejected");
                Err(AppError::TokenVerificationFailed)
            }
        }
    }

    fn decode_against(
        &self,
        jwks: &Jwks,
        raw_token: &str,
    ) -> Result<AccessTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let mut last_err = anyhow::anyhow!("JWKS document contains no keys");
        for jwk in &jwks.keys {
            let key = match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => key,
                Err(err) => {
                    last_err = anyhow::Error::new(err);
                    continue;
                }
            };
            match decode::<AccessTokenClaims>(raw_token, &key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(err) => last_err = anyhow::Error::new(err),
            }
        }
        Err(last_err)
    }

    /// Keys from the cache if fresh, otherwise fetched. The boolean reports
    /// whether the result came from the cache.
    async fn current_keys(&self) -> Result<(Jwks, bool), anyhow::Error> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.cache_ttl {
                return Ok((cached.jwks.clone(), true));
            }
        }

        match self.fetch_and_store().await {
            Ok(jwks) => Ok((jwks, false)),
            Err(err) => {
                // A dead JWKS endpoint should not take verification down while
                // the previously published key is still in hand.
                if let Some(cached) = self.cache.read().await.as_ref() {
                    tracing::warn!(error = %err, "JWKS fetch failed, using stale cache");
                    return Ok((cached.jwks.clone(), true));
                }
                Err(err)
            }
        }
    }

    async fn fetch_and_store(&self) -> Result<Jwks, anyhow::Error> {
        let jwks: Jwks = self
            .http
            .get(&self.jwks_uri)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });

        Ok(jwks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_jwks_rejects() {
        let verifier = TokenVerifier::new(
            "http://127.0.0.1:9400/jwks",
            "http://127.0.0.1:9400",
            "http://127.0.0.1:9000",
        );
        let jwks = Jwks { keys: vec![] };
        assert!(verifier.decode_against(&jwks, "not.a.token").is_err());
    }

    #[test]
    fn test_jwk_serializes_use_field() {
        let jwk = Jwk {
            kty: "RSA".to_string(),
            key_use: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n: "AQAB".to_string(),
            e: "AQAB".to_string(),
        };
        let json = serde_json::to_value(&jwk).unwrap();
        assert_eq!(json["use"], "sig");
        assert_eq!(json["kty"], "RSA");
    }
}
