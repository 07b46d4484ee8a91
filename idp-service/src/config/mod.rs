use serde::Deserialize;
use service_core::config::{get_env, parse_env};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct IdpConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub port: u16,
    /// Canonical issuer URL placed in the `iss` claim and discovery document.
    pub issuer_url: String,
    /// Every registered resource server. The full list goes into `aud` of
    /// each issued token; that is what makes one login work everywhere.
    pub audiences: Vec<String>,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Optional path to an RSA private key PEM. Unset means the bundled
    /// development key.
    pub private_key_path: Option<String>,
    pub code_expiry_seconds: i64,
    pub token_expiry_seconds: i64,
}

impl IdpConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment = match env_str.as_str() {
            "prod" => Environment::Prod,
            _ => Environment::Dev,
        };
        let is_prod = environment == Environment::Prod;

        let issuer_url = get_env("IDP_ISSUER_URL", Some("http://127.0.0.1:9400"), is_prod)?;

        Ok(IdpConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("idp-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: parse_env("IDP_PORT", Some("9400"), is_prod)?,
            issuer_url,
            audiences: get_env(
                "IDP_AUDIENCES",
                Some("http://127.0.0.1:9000,http://127.0.0.1:9001"),
                is_prod,
            )?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
            jwt: JwtConfig {
                private_key_path: env::var("JWT_PRIVATE_KEY_PATH").ok(),
                code_expiry_seconds: parse_env("AUTH_CODE_EXPIRY_SECONDS", Some("600"), is_prod)?,
                token_expiry_seconds: parse_env("TOKEN_EXPIRY_SECONDS", Some("600"), is_prod)?,
            },
        })
    }
}
