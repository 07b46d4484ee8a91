use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// `POST /token` — exchange an outstanding authorization code for a signed
/// multi-audience access token. The code is consumed on success.
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let issued = state.codes.redeem(&form.code)?;

    // Defensive: the directory cannot shrink at runtime, but a code must
    // never mint a token for an unresolvable identity.
    let user = state
        .identity
        .lookup_user(&issued.user_id)
        .ok_or(AppError::UnknownUser)?;

    let access_token = state.jwt.issue_access_token(user)?;
    tracing::info!(user = %user.username, "access token issued");

    Ok(Json(TokenResponse { access_token }))
}
