use crate::error::AppError;
use std::env;

/// Read a variable from the environment, falling back to `default` outside
/// production. In production every variable without an explicit value is an
/// error so that services fail fast on incomplete deployments.
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

/// Whether the process runs with `ENVIRONMENT=prod`.
pub fn is_prod() -> bool {
    dotenvy::dotenv().ok();
    env::var("ENVIRONMENT").map(|v| v == "prod").unwrap_or(false)
}

pub fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!(format!("{}: {}", key, e)))
    })
}
