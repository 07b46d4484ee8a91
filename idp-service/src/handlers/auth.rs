use axum::{
    extract::{Query, State},
    response::Response,
    Form,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::handlers::found;
use crate::AppState;

/// `client_id`, `redirect_uri` and `state` are carried through the login
/// redirect as opaque parameters. Echoing `state` back unchanged is the
/// caller's CSRF/correlation defense and is mandatory on every outcome.
#[derive(Debug, Deserialize, Serialize)]
pub struct AuthorizeParams {
    pub client_id: String,
    pub redirect_uri: String,
    pub state: String,
}

/// `GET /auth` — entry point of the authorization code flow; hands the
/// parameters over to the login endpoint.
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Response, AppError> {
    let query = serde_urlencoded::to_string(&params)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;
    Ok(found(&format!("{}/login?{}", state.config.issuer_url, query)))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub user_id: String,
    pub redirect_uri: String,
    pub state: String,
}

/// `POST /login` — validate the submitted user against the directory.
///
/// Unknown user: redirect back with `error=access_denied`. Known user: mint
/// an authorization code and redirect back with it. Both outcomes echo the
/// original `state`.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if state.identity.lookup_user(&form.user_id).is_none() {
        tracing::info!(user = %form.user_id, "login rejected: unknown user");
        let query = redirect_query(&[("error", "access_denied"), ("state", &form.state)])?;
        return Ok(found(&format!("{}?{}", form.redirect_uri, query)));
    }

    let code = state.codes.issue(&form.user_id);
    tracing::info!(user = %form.user_id, "authorization code issued");

    let query = redirect_query(&[("code", &code), ("state", &form.state)])?;
    Ok(found(&format!("{}?{}", form.redirect_uri, query)))
}

fn redirect_query(pairs: &[(&str, &str)]) -> Result<String, AppError> {
    serde_urlencoded::to_string(pairs).map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))
}
