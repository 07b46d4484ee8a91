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

use crate::config::TicketingConfig;
use crate::services::TicketStore;

#[derive(Clone)]
pub struct AppState {
    pub config: TicketingConfig,
    pub verifier: Arc<TokenVerifier>,
    pub authz: AccessControl,
    pub tickets: Arc<TicketStore>,
}

impl AppState {
    pub fn from_config(config: TicketingConfig) -> Self {
        let verifier = Arc::new(
            TokenVerifier::new(&config.jwks_uri(), &config.issuer_url, &config.server_url)
                .with_cache_ttl(Duration::from_secs(config.jwks_cache_ttl_seconds)),
        );
        let authz = AccessControl::new(Arc::new(IdentityStore::seeded()));

        Self {
            config,
            verifier,
            authz,
            tickets: Arc::new(TicketStore::new()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Every tool goes through token verification; claims land in request
    // extensions and handlers never touch raw headers.
    let tools = Router::new()
        .route("/tools/whoami", post(handlers::tools::whoami))
        .route("/tools/create_ticket", post(handlers::tools::create_ticket))
        .route("/tools/resolve_ticket", post(handlers::tools::resolve_ticket))
        .route("/tools/tickets_by_user", post(handlers::tools::tickets_by_user))
        .route(
            "/tools/tickets_by_status",
            post(handlers::tools::tickets_by_status),
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
