use serde::Deserialize;
use service_core::config::{get_env, parse_env};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationsConfig {
    pub service_name: String,
    pub log_level: String,
    pub port: u16,
    /// This server's canonical URL; must appear in a token's `aud` list.
    pub server_url: String,
    /// Expected authorization server URL.
    pub issuer_url: String,
    pub jwks_cache_ttl_seconds: u64,
}

impl OrganizationsConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let is_prod = env::var("ENVIRONMENT").map(|v| v == "prod").unwrap_or(false);

        Ok(OrganizationsConfig {
            service_name: get_env("SERVICE_NAME", Some("organizations-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: parse_env("ORGANIZATIONS_PORT", Some("9001"), is_prod)?,
            server_url: get_env(
                "ORGANIZATIONS_SERVER_URL",
                Some("http://127.0.0.1:9001"),
                is_prod,
            )?,
            issuer_url: get_env("IDP_ISSUER_URL", Some("http://127.0.0.1:9400"), is_prod)?,
            jwks_cache_ttl_seconds: parse_env("JWKS_CACHE_TTL_SECONDS", Some("300"), is_prod)?,
        })
    }

    pub fn jwks_uri(&self) -> String {
        format!("{}/jwks", self.issuer_url)
    }
}
