use axum::Json;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

fn default_client_name() -> String {
    "client".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub redirect_uris: Vec<String>,
    // Reserved for a future stateful client registry.
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub client_id: String,
    pub redirect_uris: Vec<String>,
}

/// `POST /register` — dynamic client registration. Stateless in this mock;
/// the only validation is that at least one redirect URI was supplied.
pub async fn register(
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<RegistrationResponse>, AppError> {
    if request.redirect_uris.is_empty() {
        return Err(AppError::InvalidRequest(anyhow::anyhow!(
            "redirect_uris required"
        )));
    }

    let client_id = Uuid::new_v4().to_string();
    tracing::info!(client_id = %client_id, client_name = %request.client_name, "client registered");

    Ok(Json(RegistrationResponse {
        client_id,
        redirect_uris: request.redirect_uris,
    }))
}
