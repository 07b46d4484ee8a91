pub mod config;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::{routing::get, routing::post, Json, Router};
use tower_http::trace::TraceLayer;

use service_core::error::AppError;
use service_core::identity::IdentityStore;

use crate::config::IdpConfig;
use crate::services::{CodeBroker, TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub config: IdpConfig,
    pub identity: Arc<IdentityStore>,
    pub codes: Arc<CodeBroker>,
    pub jwt: Arc<TokenIssuer>,
}

impl AppState {
    pub fn from_config(config: IdpConfig) -> Result<Self, AppError> {
        let identity = Arc::new(IdentityStore::seeded());
        let codes = Arc::new(CodeBroker::new(config.jwt.code_expiry_seconds));
        let jwt = Arc::new(TokenIssuer::new(
            &config.jwt,
            &config.issuer_url,
            config.audiences.clone(),
        )?);

        Ok(Self {
            config,
            identity,
            codes,
            jwt,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::well_known::discovery),
        )
        .route("/jwks", get(handlers::well_known::jwks))
        .route("/auth", get(handlers::auth::authorize))
        .route("/login", post(handlers::auth::login))
        .route("/register", post(handlers::register::register))
        .route("/token", post(handlers::token::token))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
