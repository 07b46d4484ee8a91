pub mod config;
pub mod handlers;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use service_core::auth::{require_auth, TokenVerifier};
use service_core::authz::AccessControl;
use service_core::identity::IdentityStore;

use crate::config::OrganizationsConfig;
use crate::services::OrganizationDirectory;

#[derive(Clone)]
pub struct AppState {
    pub config: OrganizationsConfig,
    pub verifier: Arc<TokenVerifier>,
    pub authz: AccessControl,
    pub organizations: Arc<OrganizationDirectory>,
}

impl AppState {
    pub fn from_config(config: OrganizationsConfig) -> Self {
        let verifier = Arc::new(
            TokenVerifier::new(&config.jwks_uri(), &config.issuer_url, &config.server_url)
                .with_cache_ttl(Duration::from_secs(config.jwks_cache_ttl_seconds)),
        );
        let authz = AccessControl::new(Arc::new(IdentityStore::seeded()));

        Self {
            config,
            verifier,
            authz,
            organizations: Arc::new(OrganizationDirectory::seeded()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let tools = Router::new()
        .route(
            "/tools/get_organization_users",
            post(handlers::tools::get_organization_users),
        )
        .route(
            "/tools/compare_user_permissions",
            post(handlers::tools::compare_user_permissions),
        )
        .route(
            "/tools/get_organizations",
            post(handlers::tools::get_organizations),
        )
        .layer(from_fn_with_state(state.verifier.clone(), require_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(tools)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
