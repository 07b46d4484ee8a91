use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use ticketing_service::{build_router, config::TicketingConfig, AppState};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    let config = TicketingConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        audience = %config.server_url,
        issuer = %config.issuer_url,
        "Starting ticketing resource server"
    );

    let port = config.port;
    let state = AppState::from_config(config);
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("Received SIGINT, starting graceful shutdown");
}
