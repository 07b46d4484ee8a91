use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use service_core::error::AppError;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DiscoveryDocument {
    pub authorization_endpoint: String,
    pub issuer: String,
    pub jwks_uri: String,
    pub token_endpoint: String,
    pub registration_endpoint: String,
}

/// OAuth2 authorization server metadata.
pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryDocument> {
    let issuer = &state.config.issuer_url;
    Json(DiscoveryDocument {
        authorization_endpoint: format!("{}/auth", issuer),
        issuer: issuer.clone(),
        jwks_uri: format!("{}/jwks", issuer),
        token_endpoint: format!("{}/token", issuer),
        registration_endpoint: format!("{}/register", issuer),
    })
}

/// Public JSON Web Key Set. No authentication: this is public key material.
pub async fn jwks(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        Json(state.jwt.jwks().clone()),
    ))
}
