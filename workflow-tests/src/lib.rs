//! Cross-service workflow integration tests library.
//!
//! Spins up the mock authorization server and both resource servers on
//! ephemeral loopback ports inside the test process, wired to each other, so
//! end-to-end tests can drive the real OAuth flow over HTTP.

use std::sync::Once;

use idp_service::{build_router as build_idp_router, config::IdpConfig, AppState as IdpState};
use organizations_service::{
    build_router as build_organizations_router, config::OrganizationsConfig,
    AppState as OrganizationsState,
};
use ticketing_service::{
    build_router as build_ticketing_router, config::TicketingConfig, AppState as TicketingState,
};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Base URLs of a running cluster.
pub struct TestCluster {
    pub issuer_url: String,
    pub ticketing_url: String,
    pub organizations_url: String,
}

async fn ephemeral_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

/// Start the IdP and both resource servers, each pointed at the others.
pub async fn spawn_cluster() -> TestCluster {
    spawn_cluster_with_token_ttl(600).await
}

/// Same cluster, but with a chosen access-token lifetime. A negative value
/// makes every issued token already expired.
pub async fn spawn_cluster_with_token_ttl(token_expiry_seconds: i64) -> TestCluster {
    init_tracing();

    let (idp_listener, issuer_url) = ephemeral_listener().await;
    let (ticketing_listener, ticketing_url) = ephemeral_listener().await;
    let (organizations_listener, organizations_url) = ephemeral_listener().await;

    let mut idp_config = IdpConfig::from_env().expect("IdP config");
    idp_config.issuer_url = issuer_url.clone();
    idp_config.audiences = vec![ticketing_url.clone(), organizations_url.clone()];
    idp_config.jwt.token_expiry_seconds = token_expiry_seconds;
    let idp_state = IdpState::from_config(idp_config).expect("IdP state");
    tokio::spawn(async move {
        axum::serve(idp_listener, build_idp_router(idp_state))
            .await
            .expect("IdP server failed");
    });

    let mut ticketing_config = TicketingConfig::from_env().expect("ticketing config");
    ticketing_config.server_url = ticketing_url.clone();
    ticketing_config.issuer_url = issuer_url.clone();
    let ticketing_state = TicketingState::from_config(ticketing_config);
    tokio::spawn(async move {
        axum::serve(ticketing_listener, build_ticketing_router(ticketing_state))
            .await
            .expect("ticketing server failed");
    });

    let mut organizations_config = OrganizationsConfig::from_env().expect("organizations config");
    organizations_config.server_url = organizations_url.clone();
    organizations_config.issuer_url = issuer_url.clone();
    let organizations_state = OrganizationsState::from_config(organizations_config);
    tokio::spawn(async move {
        axum::serve(
            organizations_listener,
            build_organizations_router(organizations_state),
        )
        .await
        .expect("organizations server failed");
    });

    TestCluster {
        issuer_url,
        ticketing_url,
        organizations_url,
    }
}

/// Start one extra ticketing server whose canonical URL is NOT in the IdP's
/// audience list, for wrong-audience rejection tests.
pub async fn spawn_unregistered_resource_server(issuer_url: &str) -> String {
    let (listener, url) = ephemeral_listener().await;

    let mut config = TicketingConfig::from_env().expect("ticketing config");
    // The server believes its canonical URL is one no token ever lists.
    config.server_url = "http://127.0.0.1:1/unregistered".to_string();
    config.issuer_url = issuer_url.to_string();
    let state = TicketingState::from_config(config);
    tokio::spawn(async move {
        axum::serve(listener, build_ticketing_router(state))
            .await
            .expect("unregistered server failed");
    });

    url
}
